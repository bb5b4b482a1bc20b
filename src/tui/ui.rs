use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use std::io;

use crate::controller::ScreenState;
use crate::tui::app::App;
use crate::tui::views::{render_entry_view, render_greeting_view, render_invitation_view};

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl Tui {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let options = ratatui::TerminalOptions {
            viewport: ratatui::Viewport::Fullscreen,
        };
        let terminal = Terminal::with_options(backend, options)?;

        Ok(Self { terminal })
    }

    pub fn draw(&mut self, app: &App) -> io::Result<()> {
        self.terminal.draw(|frame| render(frame, app))?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen, Show).ok();
        disable_raw_mode().ok();
    }
}

pub fn try_init_tui() -> io::Result<Tui> {
    Tui::new()
}

pub fn render(frame: &mut Frame, app: &App) {
    match app.controller.state() {
        ScreenState::Entry => render_entry_view(frame, app),
        ScreenState::Greeting => render_greeting_view(frame, app),
        ScreenState::Invitation => render_invitation_view(frame, app),
    }
}
