use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::tui::app::App;
use crate::tui::components::{
    card_block, centered, gold, render_header, render_status_bar, screen_layout,
};

const CARD_WIDTH: u16 = 64;

/// Scene 2: the greeting is typed out while it is narrated
pub fn render_greeting_view(frame: &mut Frame, app: &App) {
    let [header, body, status] = screen_layout(frame.area());

    render_header(frame, header, app);
    frame.render_widget(&app.stage, body);

    let card = centered(body, CARD_WIDTH, 16);
    frame.render_widget(Clear, card);
    let block = card_block(" A message for you ");
    let inner = block.inner(card);
    frame.render_widget(block, card);

    let [avatar, indicator, _, text] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new("( 🎂 )")
            .alignment(Alignment::Center)
            .style(Style::default().fg(gold()).bold()),
        avatar,
    );

    let indicator_text = if app.controller.is_speaking() {
        Span::styled("🔊 speaking...", Style::default().fg(gold()).italic())
    } else if app.controller.is_muted() {
        Span::styled("🔇 muted", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw("")
    };
    frame.render_widget(
        Paragraph::new(Line::from(indicator_text)).alignment(Alignment::Center),
        indicator,
    );

    let width = text.width.saturating_sub(2).max(1) as usize;
    let full = app
        .controller
        .greeting_message()
        .map(|message| message.as_str())
        .unwrap_or_default();
    let visible = app.controller.reveal_progress().unwrap_or(0);

    let mut lines: Vec<Line> = reveal_lines(full, visible, width)
        .into_iter()
        .map(|line| Line::from(Span::styled(line, Style::default().fg(Color::White))))
        .collect();
    if app.cursor_visible() {
        match lines.last_mut() {
            Some(line) => line.spans.push(Span::styled("|", Style::default().fg(gold()))),
            None => lines.push(Line::from(Span::styled("|", Style::default().fg(gold())))),
        }
    }
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        text,
    );

    let mute_hint = if app.controller.is_muted() {
        "unmute"
    } else {
        "mute"
    };
    render_status_bar(frame, status, &[("m/Tab", mute_hint), ("q", "quit")]);
}

/// Wrap the whole message, then keep only the first `visible` characters.
///
/// Wrapping the full text keeps words from jumping between lines while the
/// message is being typed out.
pub fn reveal_lines(full: &str, visible: usize, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    // Characters of `full` accounted for, and the byte offset they end at
    let mut shown = 0;
    let mut offset = 0;

    for line in textwrap::wrap(full, width) {
        // Whatever the wrap dropped before this line: a space, a newline, or
        // nothing when a long word was split
        let rest = full.get(offset..).unwrap_or_default();
        let skipped = rest.find(&*line).unwrap_or(0);
        shown += rest[..skipped].chars().count();
        offset += skipped;
        if shown >= visible {
            break;
        }

        let count = line.chars().count();
        let remaining = visible - shown;
        if remaining <= count {
            lines.push(line.chars().take(remaining).collect());
            break;
        }
        shown += count;
        offset += line.len();
        lines.push(line.into_owned());
    }

    lines
}
