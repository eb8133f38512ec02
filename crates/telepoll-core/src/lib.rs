//! Core of the bot API polling client.
//!
//! Transport-agnostic: the HTTP implementation lives in `telepoll-http` behind
//! the [`ports::Transport`] trait.

pub mod api;
pub mod config;
pub mod cursor;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod offset_store;
pub mod polling;
pub mod ports;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use api::{BotApi, SendMessage};
pub use cursor::{CursorState, UpdateCursor};
pub use errors::{Error, Result};
