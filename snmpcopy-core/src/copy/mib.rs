//! Field encoder for the `ccCopyTable` of CISCO-CONFIG-COPY-MIB.
//!
//! Every column instance is `1.3.6.1.4.1.9.9.96.1.1.1.1.<column>.<row>`.
//! Enumerated columns carry a 1-based wire integer; the mapping is an
//! explicit exhaustive match in both directions so reordering variants
//! can never shift an encoding.

use std::fmt;
use std::net::Ipv4Addr;

use crate::copy::row::Row;
use crate::error::CopyError;
use crate::snmp::{Oid, Value, VarBind};

/// `ccCopyEntry`, without the trailing column and row arcs.
pub const COPY_ENTRY: [u32; 13] = [1, 3, 6, 1, 4, 1, 9, 9, 96, 1, 1, 1, 1];

pub const SYS_DESCR: [u32; 9] = [1, 3, 6, 1, 2, 1, 1, 1, 0];
pub const SYS_NAME: [u32; 9] = [1, 3, 6, 1, 2, 1, 1, 5, 0];

// ── Column ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Protocol,
    SourceFileType,
    DestFileType,
    ServerAddress,
    FileName,
    UserName,
    UserPassword,
    State,
    TimeStarted,
    TimeCompleted,
    FailCause,
    EntryRowStatus,
    /// IPv6-capable address pair; never written, listed for completeness.
    ServerAddressType,
    ServerAddressRev1,
}

impl Column {
    pub fn number(self) -> u32 {
        match self {
            Column::Protocol => 2,
            Column::SourceFileType => 3,
            Column::DestFileType => 4,
            Column::ServerAddress => 5,
            Column::FileName => 6,
            Column::UserName => 7,
            Column::UserPassword => 8,
            Column::State => 10,
            Column::TimeStarted => 11,
            Column::TimeCompleted => 12,
            Column::FailCause => 13,
            Column::EntryRowStatus => 14,
            Column::ServerAddressType => 15,
            Column::ServerAddressRev1 => 16,
        }
    }

    /// The column instance for `row`.
    pub fn oid(self, row: Row) -> Oid {
        let mut arcs = Vec::with_capacity(COPY_ENTRY.len() + 2);
        arcs.extend_from_slice(&COPY_ENTRY);
        arcs.push(self.number());
        arcs.push(u32::from(row.discriminator()));
        Oid::new(arcs)
    }
}

// ── Wire enumerations ────────────────────────────────────────────

/// Two-way mapping between a variant and its wire integer.
pub trait WireEnum: Sized + Copy + 'static {
    const NAME: &'static str;
    const ALL: &'static [Self];

    fn to_wire(self) -> i32;

    fn from_wire(value: i32) -> Result<Self, CopyError> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.to_wire() == value)
            .ok_or(CopyError::UnknownVariant {
                type_name: Self::NAME,
                value: i64::from(value),
            })
    }
}

/// `ccCopyEntryRowStatus` actions (RowStatus textual convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAction {
    Active,
    NotInService,
    NotReady,
    CreateAndGo,
    CreateAndWait,
    Destroy,
}

impl WireEnum for RowAction {
    const NAME: &'static str = "RowAction";
    const ALL: &'static [Self] = &[
        RowAction::Active,
        RowAction::NotInService,
        RowAction::NotReady,
        RowAction::CreateAndGo,
        RowAction::CreateAndWait,
        RowAction::Destroy,
    ];

    fn to_wire(self) -> i32 {
        match self {
            RowAction::Active => 1,
            RowAction::NotInService => 2,
            RowAction::NotReady => 3,
            RowAction::CreateAndGo => 4,
            RowAction::CreateAndWait => 5,
            RowAction::Destroy => 6,
        }
    }
}

/// `ccCopyProtocol`.
///
/// `Ftp` keeps its wire value although many IOS releases reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferProtocol {
    Tftp,
    Ftp,
    Rcp,
    Scp,
    Sftp,
}

impl WireEnum for TransferProtocol {
    const NAME: &'static str = "TransferProtocol";
    const ALL: &'static [Self] = &[
        TransferProtocol::Tftp,
        TransferProtocol::Ftp,
        TransferProtocol::Rcp,
        TransferProtocol::Scp,
        TransferProtocol::Sftp,
    ];

    fn to_wire(self) -> i32 {
        match self {
            TransferProtocol::Tftp => 1,
            TransferProtocol::Ftp => 2,
            TransferProtocol::Rcp => 3,
            TransferProtocol::Scp => 4,
            TransferProtocol::Sftp => 5,
        }
    }
}

/// `ConfigFileType`, used by both the source and destination columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFileType {
    NetworkFile,
    IosFile,
    StartupConfig,
    RunningConfig,
    Terminal,
}

impl WireEnum for ConfigFileType {
    const NAME: &'static str = "ConfigFileType";
    const ALL: &'static [Self] = &[
        ConfigFileType::NetworkFile,
        ConfigFileType::IosFile,
        ConfigFileType::StartupConfig,
        ConfigFileType::RunningConfig,
        ConfigFileType::Terminal,
    ];

    fn to_wire(self) -> i32 {
        match self {
            ConfigFileType::NetworkFile => 1,
            ConfigFileType::IosFile => 2,
            ConfigFileType::StartupConfig => 3,
            ConfigFileType::RunningConfig => 4,
            ConfigFileType::Terminal => 5,
        }
    }
}

/// `ccCopyState`. Zero-based on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyStatus {
    NotAvailable,
    Waiting,
    Running,
    Successful,
    Failed,
}

impl CopyStatus {
    /// Polling stops at a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CopyStatus::NotAvailable | CopyStatus::Successful | CopyStatus::Failed
        )
    }

    pub fn is_success(self) -> bool {
        matches!(self, CopyStatus::NotAvailable | CopyStatus::Successful)
    }

    pub fn name(self) -> &'static str {
        match self {
            CopyStatus::NotAvailable => "not available",
            CopyStatus::Waiting => "waiting",
            CopyStatus::Running => "running",
            CopyStatus::Successful => "successful",
            CopyStatus::Failed => "failed",
        }
    }
}

impl WireEnum for CopyStatus {
    const NAME: &'static str = "CopyStatus";
    const ALL: &'static [Self] = &[
        CopyStatus::NotAvailable,
        CopyStatus::Waiting,
        CopyStatus::Running,
        CopyStatus::Successful,
        CopyStatus::Failed,
    ];

    fn to_wire(self) -> i32 {
        match self {
            CopyStatus::NotAvailable => 0,
            CopyStatus::Waiting => 1,
            CopyStatus::Running => 2,
            CopyStatus::Successful => 3,
            CopyStatus::Failed => 4,
        }
    }
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `ccCopyFailCause`. Zero-based on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCause {
    Success,
    Unknown,
    BadFilenameOrAuth,
    Timeout,
    NoMemory,
    NoConfig,
    UnsupportedProtocol,
    PartialApplyFailure,
    SystemNotReady,
    Aborted,
}

impl FailureCause {
    pub fn describe(self) -> &'static str {
        match self {
            FailureCause::Success => "copy completed successfully",
            FailureCause::Unknown => "cause unknown",
            FailureCause::BadFilenameOrAuth => "bad filename or authentication failure",
            FailureCause::Timeout => "operation timed out",
            FailureCause::NoMemory => "no memory",
            FailureCause::NoConfig => "no config",
            FailureCause::UnsupportedProtocol => "unsupported protocol",
            FailureCause::PartialApplyFailure => "some config apply failed",
            FailureCause::SystemNotReady => "system not ready",
            FailureCause::Aborted => "request aborted",
        }
    }
}

impl WireEnum for FailureCause {
    const NAME: &'static str = "FailureCause";
    const ALL: &'static [Self] = &[
        FailureCause::Success,
        FailureCause::Unknown,
        FailureCause::BadFilenameOrAuth,
        FailureCause::Timeout,
        FailureCause::NoMemory,
        FailureCause::NoConfig,
        FailureCause::UnsupportedProtocol,
        FailureCause::PartialApplyFailure,
        FailureCause::SystemNotReady,
        FailureCause::Aborted,
    ];

    fn to_wire(self) -> i32 {
        match self {
            FailureCause::Success => 0,
            FailureCause::Unknown => 1,
            FailureCause::BadFilenameOrAuth => 2,
            FailureCause::Timeout => 3,
            FailureCause::NoMemory => 4,
            FailureCause::NoConfig => 5,
            FailureCause::UnsupportedProtocol => 6,
            FailureCause::PartialApplyFailure => 7,
            FailureCause::SystemNotReady => 8,
            FailureCause::Aborted => 9,
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

// ── Encoding ─────────────────────────────────────────────────────

fn enum_binding<E: WireEnum>(column: Column, row: Row, value: E) -> VarBind {
    VarBind::new(column.oid(row), Value::Integer(value.to_wire()))
}

pub fn encode_action(row: Row, action: RowAction) -> VarBind {
    enum_binding(Column::EntryRowStatus, row, action)
}

pub fn encode_protocol(row: Row, protocol: TransferProtocol) -> VarBind {
    enum_binding(Column::Protocol, row, protocol)
}

pub fn encode_source(row: Row, source: ConfigFileType) -> VarBind {
    enum_binding(Column::SourceFileType, row, source)
}

pub fn encode_destination(row: Row, destination: ConfigFileType) -> VarBind {
    enum_binding(Column::DestFileType, row, destination)
}

pub fn encode_server_address(row: Row, addr: Ipv4Addr) -> VarBind {
    VarBind::new(Column::ServerAddress.oid(row), Value::IpAddress(addr))
}

pub fn encode_filename(row: Row, filename: &str) -> VarBind {
    VarBind::new(Column::FileName.oid(row), Value::octet_string(filename))
}

pub fn encode_username(row: Row, username: &str) -> VarBind {
    VarBind::new(Column::UserName.oid(row), Value::octet_string(username))
}

pub fn encode_password(row: Row, password: &str) -> VarBind {
    VarBind::new(Column::UserPassword.oid(row), Value::octet_string(password))
}

// ── Decoding ─────────────────────────────────────────────────────

/// Decode the first binding of a status Get.
///
/// An empty response or a binding without an integer is a caller error:
/// the status column always exists once the row has been created.
pub fn decode_status(bindings: &[VarBind]) -> Result<CopyStatus, CopyError> {
    let binding = bindings
        .first()
        .ok_or_else(|| CopyError::InvalidArgument("status response has no bindings".into()))?;
    let value = binding.value.as_integer().ok_or_else(|| {
        CopyError::InvalidArgument(format!("status of {} is {}", binding.oid, binding.value))
    })?;
    CopyStatus::from_wire(value)
}

/// Decode the first binding of a fail-cause Get.
///
/// Returns `None` when the device has no cause recorded (absent or
/// exception value), which is not an error.
pub fn decode_failure_cause(bindings: &[VarBind]) -> Result<Option<FailureCause>, CopyError> {
    let Some(binding) = bindings.first() else {
        return Ok(None);
    };
    if binding.value.is_absent() {
        return Ok(None);
    }
    let value = binding.value.as_integer().ok_or_else(|| {
        CopyError::InvalidArgument(format!(
            "fail cause of {} is {}",
            binding.oid, binding.value
        ))
    })?;
    FailureCause::from_wire(value).map(Some)
}

/// Decode a TimeTicks column; absent values yield `None`.
pub fn decode_time_ticks(bindings: &[VarBind]) -> Option<u32> {
    match bindings.first().map(|b| &b.value) {
        Some(Value::TimeTicks(t)) => Some(*t),
        _ => None,
    }
}
