//! The config-copy core: request validation, `ccCopyTable` field
//! encoding, row identity and the copy state machine.

pub mod location;
pub mod mib;
pub mod orchestrator;
pub mod phase;
pub mod poll;
pub mod row;

pub use location::{CopyPlan, CopyRequest, Location, ValidatedRequest};
pub use mib::{Column, ConfigFileType, CopyStatus, FailureCause, RowAction, TransferProtocol, WireEnum};
pub use orchestrator::{CleanupFailure, CleanupStage, CopyOrchestrator, CopyOutcome, CopyReport};
pub use phase::CopyPhase;
pub use poll::{PollPolicy, Sleeper, TokioSleeper};
pub use row::{RandomRowIds, Row, RowIdSource, RowLease, RowRegistry, SequenceRowIds};
