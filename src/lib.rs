//! Deck page model - bindings, icons and folder pages for programmable key
//! decks.
//!
//! This library exposes the core of the `deck` CLI for use in tests and by
//! front ends that drive real hardware.
//!
//! # Modules
//!
//! - `model`: icons, actions, buttons, the page tree and the device aggregate
//! - `actions`: action factories and the built-in actions
//! - `device`: hardware collaborator seam, mock and channel-backed sinks
//! - `persistence`: save scheduling
//! - `config`: profile documents and application settings
//! - `image_ops`: rasterizing composed icons
//! - `error`: error types with user-recoverable hints
#![forbid(unsafe_code)]

pub mod actions;
pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod image_ops;
pub mod logging;
pub mod model;
pub mod persistence;
