//! Prompt-to-image studio built on Gemini's streaming image models.
//!
//! The server side exposes `POST /api/generate-image`, which normalizes a
//! prompt plus optional reference image, streams the backend response and
//! replies with one aggregated envelope. The client side drives that
//! endpoint through a small state machine and hands results to the
//! share/export helpers.

pub mod ai;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod share;

pub use error::{Error, Result};
