//! Networking for Sapa UMKM
//!
//! This crate holds the wire contract of the remote account service and the
//! HTTP client the app uses to talk to it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod types;

pub use client::{AccountApi, AccountClient, ApiError, ClientConfig};
pub use types::{
    ErrorBody, LoginRequest, MessageResponse, PublicUser, RegisterRequest, UpdateUserRequest,
};
