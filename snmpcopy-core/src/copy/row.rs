//! Row identity for transient `ccCopyTable` entries.
//!
//! A [`Row`] is the integer suffix scoping every column of one copy.
//! Discriminators come from an injectable [`RowIdSource`] and are
//! reserved per device in a [`RowRegistry`] so two copies in this
//! process never share a row on the same device. Copies from other
//! processes or hosts are not covered; callers own that.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex, OnceLock};

use rand::Rng;
use tracing::debug;

use crate::error::CopyError;

pub const DISCRIMINATORS: RangeInclusive<u16> = 100..=999;

/// Draws per allocation before giving up on a busy device.
pub const MAX_DRAWS: u32 = 64;

// ── Row ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Row(u16);

impl Row {
    pub fn new(discriminator: u16) -> Result<Self, CopyError> {
        if !DISCRIMINATORS.contains(&discriminator) {
            return Err(CopyError::InvalidArgument(format!(
                "row discriminator {discriminator} outside {}..={}",
                DISCRIMINATORS.start(),
                DISCRIMINATORS.end()
            )));
        }
        Ok(Self(discriminator))
    }

    pub fn discriminator(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── RowIdSource ──────────────────────────────────────────────────

/// Supplies candidate discriminators.
pub trait RowIdSource: Send + Sync {
    fn next_discriminator(&self) -> u16;
}

/// Uniform draws from [`DISCRIMINATORS`] using the thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomRowIds;

impl RowIdSource for RandomRowIds {
    fn next_discriminator(&self) -> u16 {
        rand::rng().random_range(DISCRIMINATORS)
    }
}

/// Replays a fixed sequence, cycling when exhausted.
#[derive(Debug)]
pub struct SequenceRowIds {
    queue: Mutex<VecDeque<u16>>,
}

impl SequenceRowIds {
    pub fn new(ids: impl IntoIterator<Item = u16>) -> Self {
        Self {
            queue: Mutex::new(ids.into_iter().collect()),
        }
    }
}

impl RowIdSource for SequenceRowIds {
    fn next_discriminator(&self) -> u16 {
        let mut queue = self.queue.lock().unwrap_or_else(|p| p.into_inner());
        match queue.pop_front() {
            Some(id) => {
                queue.push_back(id);
                id
            }
            None => *DISCRIMINATORS.start(),
        }
    }
}

// ── RowRegistry ──────────────────────────────────────────────────

/// In-process reservations of active discriminators, per device.
#[derive(Debug, Default)]
pub struct RowRegistry {
    active: Mutex<HashMap<String, HashSet<u16>>>,
}

impl RowRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The registry shared by every [`Device`](crate::Device) in this process.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<RowRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(RowRegistry::new).clone()
    }

    /// Reserve a free discriminator on `device`.
    ///
    /// Out-of-range draws are rejected outright. Draws that collide with
    /// an active row are retried up to [`MAX_DRAWS`] times.
    pub fn acquire(
        self: &Arc<Self>,
        device: &str,
        ids: &dyn RowIdSource,
    ) -> Result<RowLease, CopyError> {
        for _ in 0..MAX_DRAWS {
            let row = Row::new(ids.next_discriminator())?;
            let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
            if active
                .entry(device.to_string())
                .or_default()
                .insert(row.discriminator())
            {
                debug!("reserved row {row} on {device}");
                return Ok(RowLease {
                    registry: Arc::clone(self),
                    device: device.to_string(),
                    row,
                });
            }
            debug!("row {row} busy on {device}; drawing again");
        }
        Err(CopyError::RowsExhausted {
            device: device.to_string(),
            attempts: MAX_DRAWS,
        })
    }

    pub fn is_active(&self, device: &str, row: Row) -> bool {
        let active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        active
            .get(device)
            .is_some_and(|rows| rows.contains(&row.discriminator()))
    }

    pub fn active_count(&self, device: &str) -> usize {
        let active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        active.get(device).map_or(0, HashSet::len)
    }

    fn release(&self, device: &str, row: Row) {
        let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(rows) = active.get_mut(device) {
            rows.remove(&row.discriminator());
            if rows.is_empty() {
                active.remove(device);
            }
        }
    }
}

// ── RowLease ─────────────────────────────────────────────────────

/// A reserved row; released from the registry on drop.
#[derive(Debug)]
pub struct RowLease {
    registry: Arc<RowRegistry>,
    device: String,
    row: Row,
}

impl RowLease {
    pub fn row(&self) -> Row {
        self.row
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl Drop for RowLease {
    fn drop(&mut self) {
        self.registry.release(&self.device, self.row);
        debug!("released row {} on {}", self.row, self.device);
    }
}
