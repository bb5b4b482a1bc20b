pub mod entry;
pub mod greeting;
pub mod invitation;

pub use entry::render_entry_view;
pub use greeting::render_greeting_view;
pub use invitation::render_invitation_view;
