//! Application state for Sapa UMKM
//!
//! This crate owns the signed-in session: whether a user is logged in and
//! which user, persisted in the local store and observable by every screen.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod session;

pub use session::{SessionContext, SessionError, SessionSnapshot, SessionUser};
