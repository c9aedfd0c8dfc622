//! Turn a chat message into display lines.
//!
//! Message content is split on fenced code blocks (```...```). Code goes
//! through the syntax highlighter, everything else is shown as plain text.
//! User messages sit on the right in purple, assistant messages on the left
//! in gray.

use std::sync::OnceLock;

use ratatui::layout::Alignment;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use regex::Regex;

use crate::conversation::Message;
use crate::highlight::SyntaxHighlighter;

const FENCE: &str = "```";

pub const USER_BACKGROUND: Color = Color::Rgb(0x7c, 0x3a, 0xed);
pub const USER_FOREGROUND: Color = Color::White;
pub const ASSISTANT_BACKGROUND: Color = Color::Rgb(0xf3, 0xf4, 0xf6);
pub const ASSISTANT_FOREGROUND: Color = Color::Rgb(0x1f, 0x29, 0x37);

/// One piece of a message, in original order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Prose(String),
    Code(String),
}

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)```.*?```").expect("fence pattern is valid"))
}

/// Split content into prose and code segments.
///
/// Empty prose between or around fences is dropped, whitespace-only prose is
/// kept. An opening fence without a closing one is plain prose.
pub fn split_segments(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for fenced in fence_pattern().find_iter(content) {
        push_prose(&mut segments, &content[last..fenced.start()]);

        let inner = &fenced.as_str()[FENCE.len()..fenced.as_str().len() - FENCE.len()];
        segments.push(Segment::Code(inner.trim().to_string()));
        last = fenced.end();
    }
    push_prose(&mut segments, &content[last..]);

    segments
}

fn push_prose(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Prose(text.to_string()));
    }
}

/// Bubble colours and side, the only thing that depends on who spoke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleStyle {
    pub alignment: Alignment,
    pub style: Style,
}

pub fn bubble_style(is_user: bool) -> BubbleStyle {
    if is_user {
        BubbleStyle {
            alignment: Alignment::Right,
            style: Style::default().fg(USER_FOREGROUND).bg(USER_BACKGROUND),
        }
    } else {
        BubbleStyle {
            alignment: Alignment::Left,
            style: Style::default().fg(ASSISTANT_FOREGROUND).bg(ASSISTANT_BACKGROUND),
        }
    }
}

/// Render one message as stacked lines followed by a blank spacer line.
pub fn render_message(message: &Message, highlighter: &SyntaxHighlighter) -> Text<'static> {
    let bubble = bubble_style(message.is_user);
    let mut lines: Vec<Line<'static>> = Vec::new();

    for segment in split_segments(&message.content) {
        match segment {
            Segment::Prose(text) => {
                for line in text.split('\n') {
                    lines.push(Line::from(Span::styled(line.to_string(), bubble.style)));
                }
            }
            Segment::Code(code) => {
                lines.extend(highlighter.highlight(&code));
            }
        }
    }

    let mut lines: Vec<Line<'static>> = lines
        .into_iter()
        .map(|line| line.alignment(bubble.alignment))
        .collect();
    lines.push(Line::default());

    Text::from(lines)
}

/// Render a whole conversation, oldest first.
pub fn render_conversation<'a, I>(messages: I, highlighter: &SyntaxHighlighter) -> Text<'static>
where
    I: IntoIterator<Item = &'a Message>,
{
    let mut text = Text::default();
    for message in messages {
        text.extend(render_message(message, highlighter));
    }
    text
}
