use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::tui::app::App;
use crate::tui::components::{
    card_block, centered, gold, render_header, render_status_bar, screen_layout,
};

/// Scene 3: the invitation card
pub fn render_invitation_view(frame: &mut Frame, app: &App) {
    let [header, body, status] = screen_layout(frame.area());

    render_header(frame, header, app);
    frame.render_widget(&app.stage, body);

    let event = &app.event;
    let names = app
        .controller
        .guest()
        .map(|guest| guest.joined())
        .unwrap_or_default();

    let label = Style::default().fg(Color::Gray);
    let value = Style::default().fg(Color::White).bold();
    let detail = |name: &'static str, text: &str| {
        Line::from(vec![
            Span::styled(format!("{:>6}  ", name), label),
            Span::styled(text.to_string(), value),
        ])
    };

    let lines = vec![
        Line::styled("✨ YOU'RE INVITED ✨", Style::default().fg(gold())),
        Line::from(""),
        Line::styled("Dear", label.italic()),
        Line::styled(names, Style::default().fg(gold()).bold()),
        Line::from(""),
        Line::from("🎉"),
        Line::styled(event.host.clone(), Style::default().fg(Color::White).bold()),
        Line::styled(event.tagline.clone(), Style::default().fg(gold()).italic()),
        Line::styled("──── 🎁 ────", Style::default().fg(gold())),
        detail("Date", &event.date),
        detail("Time", &event.time),
        detail("Venue", &event.venue),
        Line::from(""),
        Line::styled(
            "[ 🎉 Celebrate! 🎉 ]",
            Style::default().fg(Color::Black).bg(gold()).bold(),
        ),
        Line::from(""),
        Line::styled(event.footer.clone(), label),
        Line::styled("See you there!", Style::default().fg(gold()).bold()),
    ];

    let card = centered(body, 56, lines.len() as u16 + 2);
    frame.render_widget(Clear, card);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(card_block(" Invitation ")),
        card,
    );

    render_status_bar(
        frame,
        status,
        &[
            ("c", "celebrate"),
            ("b/Esc", "back"),
            ("m/Tab", "mute"),
            ("q", "quit"),
        ],
    );
}
