//! Syntax highlighting for code blocks using syntect's bundled definitions.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

/// Sonic Pi code is Ruby
pub const CODE_LANGUAGE: &str = "ruby";

/// Works well on the dark code block background
pub const CODE_THEME: &str = "base16-ocean.dark";

/// Background for code blocks
pub const CODE_BACKGROUND: Color = Color::Rgb(0x1e, 0x1e, 0x1e);

const PLAIN_CODE: Color = Color::Rgb(0xd4, 0xd4, 0xd4);

pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    fn syntax(&self) -> Option<&SyntaxReference> {
        self.syntax_set
            .find_syntax_by_token(CODE_LANGUAGE)
            .or_else(|| self.syntax_set.find_syntax_by_extension("rb"))
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(CODE_THEME)
            .or_else(|| self.theme_set.themes.values().next())
    }

    /// Highlight code into styled terminal lines on the code background.
    pub fn highlight(&self, code: &str) -> Vec<Line<'static>> {
        let (syntax, theme) = match (self.syntax(), self.theme()) {
            (Some(syntax), Some(theme)) => (syntax, theme),
            _ => return plain_lines(code),
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();

        for line in LinesWithEndings::from(code) {
            let ranges = match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => ranges,
                Err(e) => {
                    tracing::debug!("highlighting failed, falling back to plain text: {}", e);
                    return plain_lines(code);
                }
            };

            let spans: Vec<Span<'static>> = ranges
                .into_iter()
                .map(|(style, text)| (style, text.trim_end_matches(['\n', '\r'])))
                .filter(|(_, text)| !text.is_empty())
                .map(|(style, text)| Span::styled(text.to_string(), to_ratatui_style(style)))
                .collect();

            if spans.is_empty() {
                // Keep blank lines inside the block visible
                lines.push(Line::from(Span::styled(" ", code_style())));
            } else {
                lines.push(Line::from(spans));
            }
        }

        lines
    }

    /// Highlight code as 24-bit ANSI escapes for line-mode output.
    pub fn highlight_ansi(&self, code: &str) -> String {
        let (syntax, theme) = match (self.syntax(), self.theme()) {
            (Some(syntax), Some(theme)) => (syntax, theme),
            _ => return code.to_string(),
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut out = String::new();

        for line in LinesWithEndings::from(code) {
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => out.push_str(&as_24_bit_terminal_escaped(&ranges, false)),
                Err(_) => out.push_str(line),
            }
        }
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("\x1b[0m");

        out
    }
}

fn code_style() -> Style {
    Style::default().fg(PLAIN_CODE).bg(CODE_BACKGROUND)
}

fn plain_lines(code: &str) -> Vec<Line<'static>> {
    code.lines()
        .map(|line| {
            let text = if line.is_empty() { " " } else { line };
            Line::from(Span::styled(text.to_string(), code_style()))
        })
        .collect()
}

fn to_ratatui_style(style: syntect::highlighting::Style) -> Style {
    let fg = style.foreground;
    let mut out = Style::default()
        .fg(Color::Rgb(fg.r, fg.g, fg.b))
        .bg(CODE_BACKGROUND);

    if style.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        out = out.add_modifier(Modifier::UNDERLINED);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_ruby_syntax_available() {
        let highlighter = SyntaxHighlighter::new();
        assert!(highlighter.syntax().is_some());
        assert!(highlighter.theme().is_some());
    }

    #[test]
    fn test_highlight_preserves_text() {
        let highlighter = SyntaxHighlighter::new();
        let code = "live_loop :drums do\n  sample :bd_haus\n  sleep 0.5\nend";
        let lines = highlighter.highlight(code);

        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, code.lines().map(String::from).collect::<Vec<_>>());
    }

    #[test]
    fn test_highlight_uses_colors_and_dark_background() {
        let highlighter = SyntaxHighlighter::new();
        let lines = highlighter.highlight("sample :bd_haus, amp: 2");

        let spans = &lines[0].spans;
        assert!(spans.len() > 1, "expected several styled tokens");
        assert!(spans.iter().all(|s| s.style.bg == Some(CODE_BACKGROUND)));
        assert!(spans.iter().all(|s| matches!(s.style.fg, Some(Color::Rgb(..)))));
    }

    #[test]
    fn test_blank_lines_stay_visible() {
        let highlighter = SyntaxHighlighter::new();
        let lines = highlighter.highlight("play 60\n\nplay 64");
        assert_eq!(lines.len(), 3);
        assert_eq!(line_text(&lines[1]), " ");
    }

    #[test]
    fn test_highlight_ansi_contains_code() {
        let highlighter = SyntaxHighlighter::new();
        let out = highlighter.highlight_ansi("play 60");
        assert!(out.contains("\x1b["));
        assert!(out.contains("60"));
        assert!(out.ends_with("\x1b[0m"));
    }
}
