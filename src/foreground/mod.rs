//! # Foreground execution context.
//!
//! - [`Dispatch`] - contract of the external foreground dispatcher
//! - [`ForegroundJob`] - the zero-argument job type posted to it
//! - [`ForegroundThread`] - built-in dispatcher backed by a dedicated OS thread

mod dispatch;
mod thread;

pub use dispatch::{Dispatch, ForegroundJob};
pub use thread::ForegroundThread;
