//! Internationalization for Sapa UMKM
//!
//! This crate provides i18n support with embedded Fluent catalogs,
//! language negotiation, and message formatting. Indonesian is the
//! default language; English is available as an alternative.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lang;
pub mod translator;

pub use lang::{negotiate, Language};
pub use translator::Translator;
