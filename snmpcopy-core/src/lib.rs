//! # snmpcopy-core
//!
//! Back up and restore Cisco device configurations by driving the
//! `ccCopyTable` of CISCO-CONFIG-COPY-MIB over SNMPv2c.
//!
//! This crate contains:
//! - **Copy core**: `CopyRequest` validation, the `ccCopyTable` field
//!   encoder, row identity and the `CopyOrchestrator` state machine
//! - **SNMP**: `Oid`, BER codec, `Message`/`Pdu`, `SnmpCodec` for
//!   `tokio_util::udp::UdpFramed`, and the `Transport` trait with its
//!   `UdpTransport` implementation
//! - **Device**: `Device`, the caller-facing handle
//! - **Error**: `CopyError`, the typed `thiserror` error hierarchy

pub mod copy;
pub mod device;
pub mod error;
pub mod snmp;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use copy::{
    CleanupFailure, CleanupStage, CopyOrchestrator, CopyOutcome, CopyPhase, CopyReport,
    CopyRequest, CopyStatus, FailureCause, Location, PollPolicy, Row, RowIdSource, RowRegistry,
    Sleeper,
};
pub use device::Device;
pub use error::CopyError;
pub use snmp::{Oid, SnmpTarget, Transport, UdpTransport, Value, VarBind};
