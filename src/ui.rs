use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthChar;
use crate::app::{App, InputMode, TIP};
use crate::render::{render_conversation, USER_BACKGROUND};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, tip, chat, input, footer
    let [header_area, tip_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_tip(frame, tip_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.notice.is_some() {
        render_notice(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Sonic Pi Controller ", Style::default().fg(Color::White).bold()),
        Span::raw(" "),
        Span::styled(
            app.client().base_url().to_string(),
            Style::default().fg(Color::Gray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let stop = Line::from(vec![
        Span::styled(" x ", Style::default().bg(Color::Red).fg(Color::White).bold()),
        Span::styled(" stop the music ", Style::default().fg(Color::White)),
    ])
    .alignment(Alignment::Right);

    let [left, right] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(20)]).areas(area);
    let background = Style::default().bg(Color::Rgb(0x6d, 0x28, 0xd9));
    frame.render_widget(Paragraph::new(title).style(background), left);
    frame.render_widget(Paragraph::new(stop).style(background), right);
}

fn render_tip(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(Style::default().fg(Color::Yellow));

    let tip = Paragraph::new(vec![
        Line::from(Span::styled("Tip", Style::default().fg(Color::Yellow).bold())),
        Line::from(Span::styled(TIP, Style::default().fg(Color::Yellow))),
    ])
    .block(block)
    .wrap(Wrap { trim: true });

    frame.render_widget(tip, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and inner height for scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    let inner_width = area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Chat ({} messages) ", app.conversation.len()));

    let text = if app.conversation.is_empty() && !app.sending {
        Text::from(Span::styled(
            "Ask for a beat, a melody, or anything about Sonic Pi...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut text = render_conversation(&app.conversation, &app.highlighter);

        if app.sending {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            text.push_line(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
        text
    };

    // Row count must come from the same word wrapping the pane renders with
    let chat = Paragraph::new(text).wrap(Wrap { trim: false });
    let rows = chat.line_count(inner_width).min(u16::MAX as usize) as u16;
    app.update_scroll(rows);

    let chat = chat.block(chat_block).scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { USER_BACKGROUND } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message (Enter to send) ");

    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_window(&app.input, app.cursor, inner_width);

    let input = if app.input.is_empty() && !editing {
        Paragraph::new(Span::styled(
            "Type your message...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(visible_text)
    };

    frame.render_widget(input.block(input_block), area);

    // Show cursor when editing
    if editing && app.notice.is_none() {
        frame.set_cursor_position((
            area.x.saturating_add(cursor_x).saturating_add(1),
            area.y + 1,
        ));
    }
}

/// Slice of the composer text that fits `width` columns with the cursor in
/// view, and the cursor's column inside it. Widths are display columns.
fn input_window(input: &str, cursor: usize, width: usize) -> (String, u16) {
    let chars: Vec<char> = input.chars().collect();
    let cursor = cursor.min(chars.len());

    // Walk left from the cursor, keeping one cell free for the cursor itself
    let mut start = cursor;
    let mut cursor_cols = 0;
    while start > 0 {
        let w = chars[start - 1].width().unwrap_or(0);
        if cursor_cols + w >= width {
            break;
        }
        cursor_cols += w;
        start -= 1;
    }

    let mut visible = String::new();
    let mut used = 0;
    for &c in &chars[start..] {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        visible.push(c);
    }

    (visible, cursor_cols.min(u16::MAX as usize) as u16)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INSERT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style)];
    let hints: &[(&str, &str)] = match app.input_mode {
        InputMode::Normal => &[
            (" i ", " type "),
            (" j/k ", " scroll "),
            (" n ", " new chat "),
            (" s ", " save code "),
            (" x ", " stop "),
            (" q ", " quit "),
        ],
        InputMode::Editing => &[
            (" Enter ", " send "),
            (" Esc ", " commands "),
            (" ↑/↓ ", " scroll "),
        ],
    };
    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    if let Some(status) = &app.status {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_notice(app: &App, frame: &mut Frame, area: Rect) {
    let Some(notice) = &app.notice else {
        return;
    };

    let popup = centered_rect(60, 7, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" {} ", notice.title));

    let body = Paragraph::new(vec![
        Line::from(notice.message.as_str()),
        Line::default(),
        Line::from(Span::styled("Press Enter to close", Style::default().fg(Color::DarkGray))),
    ])
    .block(block)
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    frame.render_widget(body, popup);
}
