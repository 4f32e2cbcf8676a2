//! This crate is used by the internal tasks of `heliodond`.
//!
//! The interfaces and types defined here are useful for those wishing
//! to write a new location provider for the `heliodond` executable or
//! to embed the sun-position pipeline in another renderer.

mod types;

// Pull types down to the `heliodon-api` namespace.

pub use types::geo;
pub use types::Error;

/// A specialization of `std::result::Result<>` where the error value
/// is `types::Error`.

pub type Result<T> = std::result::Result<T, Error>;

pub mod provider;
pub mod solar;
