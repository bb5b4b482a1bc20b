use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::tui::app::App;
use crate::tui::components::{
    card_block, centered, gold, render_header, render_status_bar, screen_layout,
};

/// Scene 1: the guest types their name
pub fn render_entry_view(frame: &mut Frame, app: &App) {
    let [header, body, status] = screen_layout(frame.area());

    render_header(frame, header, app);
    frame.render_widget(&app.stage, body);

    let card = centered(body, 56, 14);
    frame.render_widget(Clear, card);
    let block = card_block(" You're Invited ");
    let inner = block.inner(card);
    frame.render_widget(block, card);

    let [badge, title, _, input, button, _, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new("✨ You're Invited ✨")
            .alignment(Alignment::Center)
            .style(Style::default().fg(gold())),
        badge,
    );
    frame.render_widget(
        Paragraph::new(app.event.title.as_str())
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White).bold()),
        title,
    );

    let cursor = if app.cursor_visible() { "▏" } else { " " };
    let input_text = if app.name_input.is_empty() {
        Line::from(vec![
            Span::styled(cursor, Style::default().fg(gold())),
            Span::styled("Enter your name", Style::default().fg(Color::DarkGray).italic()),
        ])
    } else {
        Line::from(vec![
            Span::styled(app.name_input.as_str(), Style::default().fg(Color::White)),
            Span::styled(cursor, Style::default().fg(gold())),
        ])
    };
    frame.render_widget(
        Paragraph::new(input_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title("Your name"),
        ),
        centered(input, 40, 3),
    );

    let button_style = if app.can_submit() {
        Style::default().fg(Color::Black).bg(gold()).bold()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    frame.render_widget(
        Paragraph::new("  Enter the Celebration ⏎  ")
            .alignment(Alignment::Center)
            .style(button_style),
        centered(button, 30, 1),
    );

    frame.render_widget(
        Paragraph::new("✨ A special invitation awaits you ✨")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray)),
        footer,
    );

    render_status_bar(
        frame,
        status,
        &[("Enter", "continue"), ("Tab", "mute"), ("Esc", "quit")],
    );
}
