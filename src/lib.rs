pub mod config;
pub mod controller;
pub mod effects;
pub mod greeting;
pub mod guest;
pub mod logging;
pub mod reveal;
pub mod speech;
pub mod tui;

pub use controller::{ScreenController, ScreenState, Transition, TransitionError};
pub use guest::{GuestIdentity, NameLookup};
