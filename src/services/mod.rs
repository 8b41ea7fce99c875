pub mod activation_controller;
pub mod command_shell;
pub mod target_resolver;
pub mod window_system;

pub use activation_controller::ActivationController;
pub use command_shell::CommandShell;
pub use target_resolver::TargetSpec;
pub use window_system::create_window_system;
