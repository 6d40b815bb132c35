//! # civibot
//!
//! Session crate for the municipal assistant: the canonical message store,
//! remote dispatcher with timeout/retry budgets, the appointment-booking
//! workflow, and the [`ChatSession`] coordinator that ties them together.

pub mod booking;
pub mod config;
pub mod dispatcher;
pub mod message_store;
pub mod session;

pub use booking::{BookingRequest, BookingWorkflow};
pub use config::Config;
pub use dispatcher::{DispatchPolicy, RemoteDispatcher};
pub use message_store::{merge, MessageStore, SEARCHING_PLACEHOLDER};
pub use session::{BotSink, ChatSession, GreetRegistry};
