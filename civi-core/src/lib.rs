//! # civi-core
//!
//! Core types and traits for the municipal assistant: [`ChatMessage`], the
//! [`CommandHandler`] trait, error taxonomy, and tracing initialization.
//! Transport-agnostic; used by command-handlers and the civibot session crate.

pub mod error;
pub mod logger;
pub mod types;

pub use error::{CiviError, HandlerError, Result};
pub use logger::init_tracing;
pub use types::{
    is_command, Author, Button, ChatMessage, CommandHandler, CommandOutcome, COMMAND_MARKER,
};
