//! # Command handlers
//!
//! Local interception of the fixed command set: a [`CommandChain`] offers each
//! outgoing content to its handlers in order; the first [`CommandOutcome::Reply`]
//! answers the command with synthetic bot messages and no assistant round-trip.
//! Content no handler recognizes falls through to the remote dispatcher — this
//! chain is the single gate deciding local-vs-remote.

mod chain;
mod commands;

pub use chain::CommandChain;
pub use commands::{
    ContactInfoHandler, EmergencyHandler, FaqMenuHandler, ProcedureListHandler,
    CMD_ASK_FAQ, CMD_CONTACT_INFO, CMD_GREET, CMD_LIST_PROCEDURES, CMD_REPORT_EMERGENCY,
    FAQ_CATEGORY_PREFIX,
};
