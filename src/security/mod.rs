//! Security module - Keeping update secrets out of logs and the UI
//!
//! DDNS providers authenticate updates with credentials embedded in the
//! update URL, so this module provides the helpers that strip them.

mod sanitizer;

pub use sanitizer::Sanitizer;
