//! Data models for the checklist reports backend.
//!
//! Field names serialize in camelCase to match the web client.

mod assignment;
mod notification;
mod restaurant;
mod revision;
mod submission;
mod template;

pub use assignment::*;
pub use notification::*;
pub use restaurant::*;
pub use revision::*;
pub use submission::*;
pub use template::*;
