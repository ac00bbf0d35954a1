//! Lifecycle of one copy row.
//!
//! Transitions are validated and return `Result` instead of panicking,
//! so the orchestrator cannot skip the teardown step by accident.

use crate::error::CopyError;

/// The current phase of a copy operation.
///
/// ```text
///  Validating ──► Cleared ──► Building ──► Created ──► Polling ──┬─► Succeeded ─┐
///                                │            │           │      ├─► Failed ────┤
///                                │            │           │      └─► TimedOut ──┤
///                                ▼            ▼           ▼                     ▼
///                                └────────────┴───────────┴──────────────► Deleted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyPhase {
    /// Request is being checked; nothing sent yet.
    #[default]
    Validating,

    /// Row reserved and any stale entry destroyed.
    Cleared,

    /// Creation bindings being assembled.
    Building,

    /// Creation Set issued.
    Created,

    /// Waiting for a terminal `ccCopyState`.
    Polling,

    Succeeded,
    Failed,
    TimedOut,

    /// Destroy issued; the row is gone (or best-effort tried).
    Deleted,
}

impl std::fmt::Display for CopyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl CopyPhase {
    /// Returns `true` once polling has settled on an outcome.
    pub fn is_outcome(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::TimedOut)
    }

    /// Returns `true` while a row may exist on the device and still
    /// needs a destroy.
    pub fn needs_teardown(&self) -> bool {
        !matches!(self, Self::Validating | Self::Deleted)
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Valid from: `Validating`.
    pub fn clear(&mut self) -> Result<(), CopyError> {
        self.step(
            matches!(self, Self::Validating),
            Self::Cleared,
            "cannot clear: not in Validating state",
        )
    }

    /// Valid from: `Cleared`.
    pub fn build(&mut self) -> Result<(), CopyError> {
        self.step(
            matches!(self, Self::Cleared),
            Self::Building,
            "cannot build: not in Cleared state",
        )
    }

    /// Valid from: `Building`.
    pub fn create(&mut self) -> Result<(), CopyError> {
        self.step(
            matches!(self, Self::Building),
            Self::Created,
            "cannot create: not in Building state",
        )
    }

    /// Valid from: `Created`.
    pub fn poll(&mut self) -> Result<(), CopyError> {
        self.step(
            matches!(self, Self::Created),
            Self::Polling,
            "cannot poll: not in Created state",
        )
    }

    /// Valid from: `Polling`; `outcome` must be an outcome phase.
    pub fn settle(&mut self, outcome: CopyPhase) -> Result<(), CopyError> {
        if !outcome.is_outcome() {
            return Err(CopyError::IllegalTransition(
                "cannot settle on a non-outcome phase",
            ));
        }
        self.step(
            matches!(self, Self::Polling),
            outcome,
            "cannot settle: not in Polling state",
        )
    }

    /// Valid from every phase that may own a row on the device.
    pub fn delete(&mut self) -> Result<(), CopyError> {
        self.step(
            self.needs_teardown(),
            Self::Deleted,
            "cannot delete: no row to delete",
        )
    }

    fn step(
        &mut self,
        allowed: bool,
        next: CopyPhase,
        why: &'static str,
    ) -> Result<(), CopyError> {
        if !allowed {
            return Err(CopyError::IllegalTransition(why));
        }
        tracing::debug!("copy phase {self} -> {next}");
        *self = next;
        Ok(())
    }
}
