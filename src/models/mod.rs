//! Data models for the glazing website backend.
//!
//! Field names serialize in camelCase to match the website's JavaScript forms.

mod intake;
mod payload;
mod review;

pub use intake::*;
pub use payload::*;
pub use review::*;
