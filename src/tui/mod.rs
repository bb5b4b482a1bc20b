pub mod app;
pub mod components;
pub mod event_handler;
pub mod stage;
pub mod ui;
pub mod views;

pub use app::App;
pub use event_handler::EventHandler;
pub use ui::try_init_tui;
