//! Caller-facing handle for one SNMP-managed device.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::copy::mib::{SYS_DESCR, SYS_NAME};
use crate::copy::{CopyOrchestrator, CopyReport, CopyRequest};
use crate::error::CopyError;
use crate::snmp::{Oid, SnmpTarget, Transport, UdpTransport, VarBind};

/// A device reachable over SNMPv2c.
///
/// ```no_run
/// # async fn demo() -> Result<(), snmpcopy_core::CopyError> {
/// use snmpcopy_core::{CopyRequest, Device, Location, SnmpTarget};
///
/// let device = Device::new(SnmpTarget::new("192.0.2.1", "private"));
/// let request = CopyRequest::new(Location::Running, Location::Tftp)
///     .server("192.0.2.50")
///     .filename("r1-confg");
/// let report = device.copy(&request).await?;
/// println!("{report}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Device {
    transport: Arc<UdpTransport>,
    orchestrator: CopyOrchestrator,
}

impl Device {
    pub fn new(target: SnmpTarget) -> Self {
        let key = target.key();
        let transport = Arc::new(UdpTransport::new(target));
        let orchestrator = CopyOrchestrator::new(transport.clone(), key);
        Self {
            transport,
            orchestrator,
        }
    }

    /// Adjust the copy orchestrator (poll policy, callbacks, ...).
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(CopyOrchestrator) -> CopyOrchestrator,
    {
        self.orchestrator = f(self.orchestrator);
        self
    }

    pub fn orchestrator_mut(&mut self) -> &mut CopyOrchestrator {
        &mut self.orchestrator
    }

    pub fn target(&self) -> &SnmpTarget {
        self.transport.target()
    }

    pub async fn copy(&self, request: &CopyRequest) -> Result<CopyReport, CopyError> {
        self.orchestrator.copy(request).await
    }

    pub async fn copy_until(
        &self,
        request: &CopyRequest,
        cancel: &CancellationToken,
    ) -> Result<CopyReport, CopyError> {
        self.orchestrator.copy_until(request, cancel).await
    }

    pub async fn get(&self, oids: &[Oid]) -> Result<Vec<VarBind>, CopyError> {
        self.transport.get(oids).await
    }

    pub async fn set(&self, bindings: &[VarBind]) -> Result<Vec<VarBind>, CopyError> {
        self.transport.set(bindings).await
    }

    /// `sysDescr.0`
    pub async fn system_description(&self) -> Result<String, CopyError> {
        self.scalar_text(Oid::from(&SYS_DESCR[..])).await
    }

    /// `sysName.0`
    pub async fn system_name(&self) -> Result<String, CopyError> {
        self.scalar_text(Oid::from(&SYS_NAME[..])).await
    }

    async fn scalar_text(&self, oid: Oid) -> Result<String, CopyError> {
        let bindings = self.get(std::slice::from_ref(&oid)).await?;
        let binding = bindings
            .into_iter()
            .next()
            .ok_or_else(|| CopyError::malformed(format!("no binding returned for {oid}")))?;
        Ok(binding.value.to_string())
    }
}
