use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::tui::app::App;

const BAR_STYLE: Style = Style::new().bg(Color::Black).fg(Color::White);
const GOLD: Color = Color::Rgb(212, 175, 55);

/// Title left-aligned, sound state and version right-aligned
pub fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let title = app.event.title.as_str();
    let sound = sound_label(app);
    let version_text = format!("{{{}}}", env!("VERSION_STRING"));

    let used = title.chars().count() + sound.chars().count() + version_text.chars().count() + 4;
    let spacing = " ".repeat((area.width as usize).saturating_sub(used).max(1));

    let spans = vec![
        Span::styled(" ", BAR_STYLE),
        Span::styled(title, BAR_STYLE.fg(GOLD).bold()),
        Span::styled(spacing, BAR_STYLE),
        Span::styled(sound, BAR_STYLE),
        Span::styled(" ", BAR_STYLE),
        Span::styled(version_text, BAR_STYLE.fg(Color::DarkGray)),
        Span::styled(" ", BAR_STYLE),
    ];

    frame.render_widget(Paragraph::new(Line::from(spans)).style(BAR_STYLE), area);
}

/// Key hints for the current screen
pub fn render_status_bar(frame: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let key_style = Style::default().bg(Color::White).fg(Color::Black).bold();
    let text_style = Style::default().bg(Color::White).fg(Color::Black);

    let mut spans = vec![Span::styled(" ", text_style)];
    for (index, (key, action)) in hints.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(" | ", text_style));
        }
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(format!(" {}", action), text_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).style(text_style), area);
}

pub fn sound_label(app: &App) -> &'static str {
    if !app.controller.speech_available() {
        "text only"
    } else if app.controller.is_muted() {
        "🔇 muted"
    } else {
        "🔊 sound on"
    }
}

/// Header, body, status bar
pub fn screen_layout(area: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area)
}

/// A `width` x `height` rectangle centered in `area`, clipped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn card_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(GOLD))
        .title(title)
        .title_alignment(Alignment::Center)
}

pub fn gold() -> Color {
    GOLD
}
