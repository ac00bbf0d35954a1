//! Request/response exchange with an SNMP agent.
//!
//! The copy state machine only ever sees the [`Transport`] trait.
//! [`UdpTransport`] is the production implementation: SNMPv2c with a
//! community string, one fresh UDP socket per request, and a
//! timeout/retry loop that matches responses by request-id.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};
use tokio_util::udp::UdpFramed;
use tracing::{debug, warn};

use crate::error::CopyError;
use crate::snmp::codec::SnmpCodec;
use crate::snmp::oid::Oid;
use crate::snmp::pdu::{Message, Pdu, PduType};
use crate::snmp::value::VarBind;

// ── Constants ────────────────────────────────────────────────────

pub const DEFAULT_PORT: u16 = 161;
pub const DEFAULT_COMMUNITY: &str = "private";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_RETRIES: u32 = 5;

// ── Transport ────────────────────────────────────────────────────

/// The two operations the copy orchestrator needs from the wire.
///
/// Both fail with a transport error (`Io`, `NoResponse`, `Resolve`)
/// when the exchange itself breaks, or with `CopyError::Protocol` when
/// the device answers with a non-zero error-status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, oids: &[Oid]) -> Result<Vec<VarBind>, CopyError>;

    async fn set(&self, bindings: &[VarBind]) -> Result<Vec<VarBind>, CopyError>;
}

// ── SnmpTarget ───────────────────────────────────────────────────

/// Where and how to reach one device.
#[derive(Debug, Clone)]
pub struct SnmpTarget {
    host: String,
    community: String,
    port: u16,
    source_address: IpAddr,
    timeout: Duration,
    retries: u32,
}

impl SnmpTarget {
    pub fn new(host: impl Into<String>, community: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            community: community.into(),
            port: DEFAULT_PORT,
            source_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Local address to send from; port is always ephemeral.
    pub fn with_source_address(mut self, addr: IpAddr) -> Self {
        self.source_address = addr;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn community(&self) -> &str {
        &self.community
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn source_address(&self) -> IpAddr {
        self.source_address
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Identity used to scope row discriminators to one device.
    pub fn key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── UdpTransport ─────────────────────────────────────────────────

#[derive(Debug)]
pub struct UdpTransport {
    target: SnmpTarget,
    next_request_id: AtomicI32,
}

impl UdpTransport {
    pub fn new(target: SnmpTarget) -> Self {
        Self {
            target,
            next_request_id: AtomicI32::new(rand::random::<i32>() & 0x3FFF_FFFF),
        }
    }

    pub fn target(&self) -> &SnmpTarget {
        &self.target
    }

    fn request_id(&self) -> i32 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed) & i32::MAX
    }

    async fn resolve(&self) -> Result<SocketAddr, CopyError> {
        let want_v4 = self.target.source_address.is_ipv4();
        let mut addrs = tokio::net::lookup_host((self.target.host.as_str(), self.target.port))
            .await
            .map_err(|e| CopyError::Resolve(format!("{}: {e}", self.target.host)))?;
        addrs.find(|a| a.is_ipv4() == want_v4).ok_or_else(|| {
            CopyError::Resolve(format!(
                "{}: no address matching source {}",
                self.target.host, self.target.source_address
            ))
        })
    }

    async fn exchange(
        &self,
        pdu_type: PduType,
        bindings: Vec<VarBind>,
    ) -> Result<Vec<VarBind>, CopyError> {
        let remote = self.resolve().await?;
        let socket = UdpSocket::bind(SocketAddr::new(self.target.source_address, 0)).await?;
        let mut framed = UdpFramed::new(socket, SnmpCodec);

        let request_id = self.request_id();
        let request = Message::new(
            self.target.community.clone(),
            Pdu::request(pdu_type, request_id, bindings),
        );

        let attempts = self.target.retries + 1;
        for attempt in 1..=attempts {
            debug!(
                "{pdu_type:?} #{request_id} -> {remote} (attempt {attempt}/{attempts}, {} binding(s))",
                request.pdu.bindings.len()
            );
            framed.send((request.clone(), remote)).await?;

            let deadline = Instant::now() + self.target.timeout;
            while let Ok(next) = timeout_at(deadline, framed.next()).await {
                let (response, from) = match next {
                    Some(Ok(received)) => received,
                    Some(Err(CopyError::Io(e))) => return Err(CopyError::Io(e)),
                    Some(Err(e)) => {
                        warn!("discarding undecodable datagram: {e}");
                        continue;
                    }
                    None => {
                        return Err(CopyError::Io(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "socket closed",
                        )));
                    }
                };
                if response.pdu.pdu_type != PduType::Response
                    || response.pdu.request_id != request_id
                {
                    debug!(
                        "ignoring {:?} #{} from {from}",
                        response.pdu.pdu_type, response.pdu.request_id
                    );
                    continue;
                }
                response.pdu.check()?;
                return Ok(response.pdu.bindings);
            }
        }

        Err(CopyError::NoResponse {
            attempts,
            timeout: self.target.timeout,
        })
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn get(&self, oids: &[Oid]) -> Result<Vec<VarBind>, CopyError> {
        let bindings = oids.iter().cloned().map(VarBind::null).collect();
        self.exchange(PduType::GetRequest, bindings).await
    }

    async fn set(&self, bindings: &[VarBind]) -> Result<Vec<VarBind>, CopyError> {
        self.exchange(PduType::SetRequest, bindings.to_vec()).await
    }
}

// ── Tests ────────────────────────────────────────────────────────
