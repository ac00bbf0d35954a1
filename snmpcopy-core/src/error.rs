//! Domain-specific error types for config-copy operations.
//!
//! All fallible operations return `Result<T, CopyError>`.
//! Malformed datagrams and unexpected device answers surface as typed
//! errors; nothing on the wire path panics.

use std::time::Duration;

use thiserror::Error;

use crate::snmp::{ErrorStatus, Oid};

/// The canonical error type for the config-copy driver.
#[derive(Debug, Error)]
pub enum CopyError {
    // ── Request Errors ───────────────────────────────────────────
    /// The caller's copy request cannot be executed as given.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // ── Contract Errors ──────────────────────────────────────────
    /// An encoder or decoder was handed a value outside its domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} value: {value}")]
    UnknownVariant { type_name: &'static str, value: i64 },

    // ── Transport Errors ─────────────────────────────────────────
    /// The UDP/IO layer reported an error.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// The device never answered.
    #[error("no response after {attempts} attempt(s) of {timeout:?}")]
    NoResponse { attempts: u32, timeout: Duration },

    /// The device or server name could not be resolved.
    #[error("cannot resolve {0}")]
    Resolve(String),

    // ── Protocol Errors ──────────────────────────────────────────
    /// The device rejected a request with a non-zero error-status.
    #[error("SNMP error {status} at {}", offending_label(.offending))]
    Protocol {
        status: ErrorStatus,
        index: u32,
        offending: Option<Oid>,
    },

    /// A datagram could not be decoded as an SNMP message.
    #[error("malformed message: {0}")]
    Malformed(String),

    // ── Lifecycle Errors ─────────────────────────────────────────
    /// Every discriminator drawn was already in use on the device.
    #[error("no free row discriminator on {device} after {attempts} draws")]
    RowsExhausted { device: String, attempts: u32 },

    /// The copy was cancelled by the caller.
    #[error("copy cancelled")]
    Cancelled,

    /// The copy state machine was driven out of order.
    #[error("illegal transition: {0}")]
    IllegalTransition(&'static str),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl CopyError {
    /// Returns `true` for failures of the exchange itself, where
    /// retrying the whole copy may help.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CopyError::Io(_) | CopyError::NoResponse { .. } | CopyError::Resolve(_)
        )
    }

    pub(crate) fn malformed(what: impl Into<String>) -> Self {
        CopyError::Malformed(what.into())
    }
}

fn offending_label(offending: &Option<Oid>) -> String {
    offending
        .as_ref()
        .map_or_else(|| "?".to_string(), Oid::to_string)
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for CopyError {
    fn from(s: String) -> Self {
        CopyError::Other(s)
    }
}

impl From<&str> for CopyError {
    fn from(s: &str) -> Self {
        CopyError::Other(s.to_string())
    }
}
