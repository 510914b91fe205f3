//! Updater module - One-shot DDNS update attempts
//!
//! The [`Updater`] trait is the seam between the polling loop and the
//! network: the agent only ever sees a [`StatusEvent`], and tests swap in
//! their own implementation.

mod base;
mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use base::*;
pub use http::{HttpUpdater, REQUEST_TIMEOUT};
