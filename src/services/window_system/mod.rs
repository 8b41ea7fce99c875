//! WindowSystem service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for talking to the OS:
//! taking process snapshots, enumerating top-level windows, reading their
//! visibility/title/owner and delivering the activation message.
//! It MUST NOT decide which window is the target. Target selection lives in
//! TargetResolver, scheduling lives in ActivationController.

mod dry_run;
#[cfg(test)]
pub(crate) mod fake;
#[cfg(windows)]
mod win32;
mod r#trait;

pub use self::r#trait::{
    create_window_system, Activator, ProcessDirectory, WindowDirectory, WindowSystem,
};
