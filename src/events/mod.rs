pub mod command;
pub mod window;

pub use command::ControlCommand;
pub use window::{ProcessEntry, WindowHandle};
