//! `duskdb`: an in-memory key-value store that speaks the Redis
//! Serialization Protocol (RESP) over TCP.
//!
//! The four subsystems spec.md calls the "core" map onto modules here:
//! the wire codec (`frame`, `parse`), the keyspace (`db`, `zset` for the
//! sorted-set value engine), the concurrent server (`server`,
//! `connection`, `session`, `shutdown`), and the snapshot engine
//! (`snapshot`). `cmd` holds the 129-command dispatch table; `hub` is the
//! pub/sub fan-out graph; `reaper` is the active-expiry background task.

pub mod config;

pub mod cmd;

pub use cmd::Command;

mod connection;

pub use connection::Connection;

pub mod frame;

pub use frame::Frame;

pub mod db;

pub use db::Db;

mod parse;

use parse::{Parse, ParseError};

pub mod server;

pub mod hub;
pub mod metrics;
pub mod reaper;
pub mod session;
pub mod shutdown;
pub mod snapshot;
pub mod utils;
pub mod zset;

use shutdown::Shutdown;
use thiserror::Error;

/// Default port the server listens on (spec.md §6).
pub const DEFAULT_PORT: u16 = 6379;

/// Error returned by most functions.
///
/// Boxing is avoided in hot paths (`parse::ParseError`, `frame::Error`) for
/// the same reason the teacher's original comment explains: those errors
/// are hit and handled during ordinary operation (a partial frame on the
/// socket), not truly exceptional, so a concrete enum is worth the extra
/// type. Everywhere else a boxed `std::error::Error` is sufficient.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DuskDbError {
    #[error("{0}")]
    String(&'static str),
    #[error("{0}")]
    Owned(String),
}

/// A specialized `Result` type for duskdb operations.
pub type Result<T> = std::result::Result<T, Error>;
