//! # progress-overlay
//!
//! `progress-overlay` drives a progress bar overlay from host instructions. A host sends
//! "progress" and "cancel" messages; the overlay animates toward 100% over the requested
//! duration and reports completion back to the host with a fire-and-forget callback.
//!
//! The [`ProgressBar`] controller talks to its surface only through the [`Element`] contract, so
//! it can drive anything from a DOM binding to the in-memory [`Document`] that the bundled
//! terminal renderer draws.

#![warn(missing_docs)]

// # Organization
//
// Types are re-exported in the root so users of the library have a flat namespace to work with.

mod canvas;
mod config;
mod controller;
mod document;
mod element;
mod message;
mod notifier;
mod render;
mod runtime;
mod terminal;

mod flattened_exports {
    pub use crate::canvas::*;
    pub use crate::config::*;
    pub use crate::controller::*;
    pub use crate::document::*;
    pub use crate::element::*;
    pub use crate::message::*;
    pub use crate::notifier::*;
    pub use crate::render::*;
    pub use crate::runtime::*;
    pub use crate::terminal::*;
}

pub use flattened_exports::*;

/// By importing this module, you'll bring all of the crate's commonly used types into scope.
pub mod prelude {
    pub use crate::flattened_exports::*;
}
