//! External-program runner for vdiff.
//!
//! The render engine only needs one thing from the outside world: run a
//! program with some arguments, wait for it, and hand back what it printed.
//! [`ProcessRunner`] is that contract; [`SystemProcess`] is the real
//! implementation backed by [`std::process::Command`].

pub mod error;
pub mod runner;

pub use error::ProcessError;
pub use runner::{ProcessRunner, SystemProcess};
