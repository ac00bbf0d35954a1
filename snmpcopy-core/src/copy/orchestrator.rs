//! Drives one `ccCopyTable` row from creation to teardown.
//!
//! ```text
//! validate ─► reserve row ─► destroy stale row ─► Set(create-and-go)
//!     ─► poll ccCopyState ─► [read fail cause] ─► Set(destroy) ─► report
//! ```
//!
//! Teardown runs on every path once a row has been reserved, including
//! creation failures, polling errors and cancellation. Its own failure
//! never replaces the outcome; it goes to the log and to any
//! [`CopyOrchestrator::on_cleanup_failure`] callbacks instead.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::copy::location::{CopyPlan, CopyRequest, resolve_server};
use crate::copy::mib::{self, Column, CopyStatus, FailureCause, RowAction};
use crate::copy::phase::CopyPhase;
use crate::copy::poll::{PollPolicy, Sleeper, TokioSleeper};
use crate::copy::row::{RandomRowIds, Row, RowIdSource, RowRegistry};
use crate::error::CopyError;
use crate::snmp::Transport;

type CleanupCallback = Box<dyn Fn(&CleanupFailure) + Send + Sync + 'static>;

// ── Outcome ──────────────────────────────────────────────────────

/// How polling ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// `successful` or `not available`.
    Succeeded(CopyStatus),
    /// `failed`, with the device's cause if it recorded one.
    Failed(Option<FailureCause>),
    /// Attempts ran out; carries the last non-terminal status seen.
    TimedOut(Option<CopyStatus>),
}

impl CopyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CopyOutcome::Succeeded(_))
    }

    fn phase(&self) -> CopyPhase {
        match self {
            CopyOutcome::Succeeded(_) => CopyPhase::Succeeded,
            CopyOutcome::Failed(_) => CopyPhase::Failed,
            CopyOutcome::TimedOut(_) => CopyPhase::TimedOut,
        }
    }
}

impl fmt::Display for CopyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyOutcome::Succeeded(status) => f.write_str(status.name()),
            CopyOutcome::Failed(Some(cause)) => f.write_str(cause.describe()),
            CopyOutcome::Failed(None) => f.write_str(CopyStatus::Failed.name()),
            CopyOutcome::TimedOut(Some(status)) => f.write_str(status.name()),
            CopyOutcome::TimedOut(None) => f.write_str("no status observed"),
        }
    }
}

/// Result of a completed copy. Displays as the one-line summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyReport {
    pub row: Row,
    pub outcome: CopyOutcome,
    /// Status polls issued.
    pub polls: u32,
    /// `ccCopyTimeStarted`, when read.
    pub started: Option<u32>,
    /// `ccCopyTimeCompleted`, when read.
    pub completed: Option<u32>,
}

impl CopyReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.outcome, CopyOutcome::TimedOut(_))
    }
}

impl fmt::Display for CopyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "snmp copy result: {}", self.outcome)
    }
}

// ── Cleanup diagnostics ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStage {
    /// The pre-emptive destroy before the row is created.
    StaleRowClear,
    /// The destroy after the copy finished or failed.
    Teardown,
}

/// A destroy that failed and was swallowed.
#[derive(Debug)]
pub struct CleanupFailure {
    pub device: String,
    pub row: Row,
    pub stage: CleanupStage,
    pub error: CopyError,
}

// ── CopyOrchestrator ─────────────────────────────────────────────

pub struct CopyOrchestrator {
    transport: Arc<dyn Transport>,
    device: String,
    registry: Arc<RowRegistry>,
    row_ids: Arc<dyn RowIdSource>,
    sleeper: Arc<dyn Sleeper>,
    policy: PollPolicy,
    clear_stale_row: bool,
    read_timestamps: bool,
    cleanup_callbacks: Vec<CleanupCallback>,
}

impl CopyOrchestrator {
    /// `device` scopes row reservations; use the same key for every
    /// orchestrator talking to the same agent.
    pub fn new(transport: Arc<dyn Transport>, device: impl Into<String>) -> Self {
        Self {
            transport,
            device: device.into(),
            registry: RowRegistry::global(),
            row_ids: Arc::new(RandomRowIds),
            sleeper: Arc::new(TokioSleeper),
            policy: PollPolicy::default(),
            clear_stale_row: true,
            read_timestamps: false,
            cleanup_callbacks: Vec::new(),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_row_ids(mut self, ids: Arc<dyn RowIdSource>) -> Self {
        self.row_ids = ids;
        self
    }

    pub fn with_registry(mut self, registry: Arc<RowRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Skip the destroy issued against the reserved row before creation.
    ///
    /// That destroy is not the teardown: exactly one destroy follows the
    /// creation Set, so an enabled clear means two destroys per copy.
    pub fn with_stale_row_clear(mut self, enabled: bool) -> Self {
        self.clear_stale_row = enabled;
        self
    }

    /// Read start/completion timestamps before tearing the row down.
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.read_timestamps = enabled;
        self
    }

    pub fn on_cleanup_failure<F>(&mut self, f: F)
    where
        F: Fn(&CleanupFailure) + Send + Sync + 'static,
    {
        self.cleanup_callbacks.push(Box::new(f));
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub async fn copy(&self, request: &CopyRequest) -> Result<CopyReport, CopyError> {
        self.copy_until(request, &CancellationToken::new()).await
    }

    /// Run a copy, aborting the polling loop when `cancel` fires.
    ///
    /// A cancelled copy still destroys its row before returning
    /// [`CopyError::Cancelled`].
    pub async fn copy_until(
        &self,
        request: &CopyRequest,
        cancel: &CancellationToken,
    ) -> Result<CopyReport, CopyError> {
        let mut phase = CopyPhase::default();

        let validated = request.validate()?;
        let server = match validated.server() {
            Some(name) => Some(resolve_server(name).await?),
            None => None,
        };
        let plan = validated.into_plan(server)?;

        let lease = self.registry.acquire(&self.device, self.row_ids.as_ref())?;
        let row = lease.row();
        info!(
            "copy {} -> {} on {} (row {row})",
            request.source, request.destination, self.device
        );

        phase.clear()?;
        if self.clear_stale_row {
            if let Err(error) = self.destroy(row).await {
                self.report_cleanup(row, CleanupStage::StaleRowClear, error);
            }
        }

        let result = self.drive(&plan, row, &mut phase, cancel).await;

        if let Err(error) = self.destroy(row).await {
            self.report_cleanup(row, CleanupStage::Teardown, error);
        }
        phase.delete()?;
        drop(lease);

        match &result {
            Ok(report) => info!("row {row} on {}: {report}", self.device),
            Err(e) => warn!("row {row} on {}: copy aborted: {e}", self.device),
        }
        result
    }

    async fn drive(
        &self,
        plan: &CopyPlan,
        row: Row,
        phase: &mut CopyPhase,
        cancel: &CancellationToken,
    ) -> Result<CopyReport, CopyError> {
        phase.build()?;
        let bindings = plan.bindings(row);

        phase.create()?;
        self.transport.set(&bindings).await?;

        phase.poll()?;
        let (outcome, polls) = self.poll(row, cancel).await?;
        phase.settle(outcome.phase())?;

        let (started, completed) = if self.read_timestamps {
            self.timestamps(row).await
        } else {
            (None, None)
        };

        Ok(CopyReport {
            row,
            outcome,
            polls,
            started,
            completed,
        })
    }

    async fn poll(
        &self,
        row: Row,
        cancel: &CancellationToken,
    ) -> Result<(CopyOutcome, u32), CopyError> {
        let status_oid = [Column::State.oid(row)];
        let mut interval = self.policy.interval;
        let mut last = None;

        for attempt in 1..=self.policy.max_attempts {
            if cancel.is_cancelled() {
                return Err(CopyError::Cancelled);
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CopyError::Cancelled),
                _ = self.sleeper.sleep(interval) => {}
            }

            let status = mib::decode_status(&self.transport.get(&status_oid).await?)?;
            trace!("row {row} poll {attempt}: {status}");

            match status {
                CopyStatus::Successful | CopyStatus::NotAvailable => {
                    return Ok((CopyOutcome::Succeeded(status), attempt));
                }
                CopyStatus::Failed => {
                    let bindings = self.transport.get(&[Column::FailCause.oid(row)]).await?;
                    let cause = mib::decode_failure_cause(&bindings)?;
                    return Ok((CopyOutcome::Failed(cause), attempt));
                }
                CopyStatus::Waiting | CopyStatus::Running => last = Some(status),
            }
            interval = self.policy.next_interval(interval);
        }

        debug!(
            "row {row}: no terminal status after {} polls",
            self.policy.max_attempts
        );
        Ok((CopyOutcome::TimedOut(last), self.policy.max_attempts))
    }

    async fn timestamps(&self, row: Row) -> (Option<u32>, Option<u32>) {
        let oids = [Column::TimeStarted.oid(row), Column::TimeCompleted.oid(row)];
        match self.transport.get(&oids).await {
            Ok(bindings) => (
                mib::decode_time_ticks(&bindings[..bindings.len().min(1)]),
                mib::decode_time_ticks(bindings.get(1..).unwrap_or_default()),
            ),
            Err(e) => {
                debug!("row {row}: timestamps unavailable: {e}");
                (None, None)
            }
        }
    }

    async fn destroy(&self, row: Row) -> Result<(), CopyError> {
        self.transport
            .set(&[mib::encode_action(row, RowAction::Destroy)])
            .await
            .map(|_| ())
    }

    fn report_cleanup(&self, row: Row, stage: CleanupStage, error: CopyError) {
        match stage {
            CleanupStage::StaleRowClear => {
                debug!("row {row} on {}: stale-row destroy failed: {error}", self.device)
            }
            CleanupStage::Teardown => {
                warn!("row {row} on {}: teardown destroy failed: {error}", self.device)
            }
        }
        let failure = CleanupFailure {
            device: self.device.clone(),
            row,
            stage,
            error,
        };
        for callback in &self.cleanup_callbacks {
            callback(&failure);
        }
    }
}

impl fmt::Debug for CopyOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyOrchestrator")
            .field("device", &self.device)
            .field("policy", &self.policy)
            .field("clear_stale_row", &self.clear_stale_row)
            .field("read_timestamps", &self.read_timestamps)
            .field("cleanup_callbacks", &self.cleanup_callbacks.len())
            .finish()
    }
}
