//! Copy endpoints and request validation.
//!
//! A [`CopyRequest`] is validated into a [`CopyPlan`] before any row is
//! reserved or any datagram leaves the host. The plan is row-agnostic;
//! [`CopyPlan::bindings`] renders it for a concrete row.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::copy::mib::{self, ConfigFileType, RowAction, TransferProtocol};
use crate::copy::row::Row;
use crate::error::CopyError;
use crate::snmp::VarBind;

// ── Location ─────────────────────────────────────────────────────

/// Where a configuration is copied from or to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Running,
    Startup,
    Tftp,
    Ftp,
    Rcp,
    Scp,
    Sftp,
}

impl Location {
    pub const ALL: [Location; 7] = [
        Location::Running,
        Location::Startup,
        Location::Tftp,
        Location::Ftp,
        Location::Rcp,
        Location::Scp,
        Location::Sftp,
    ];

    /// The device's own running or startup configuration.
    pub fn is_local(self) -> bool {
        matches!(self, Location::Running | Location::Startup)
    }

    /// Needs an external server and a filename.
    pub fn is_network(self) -> bool {
        !self.is_local()
    }

    /// Needs a username and password on top of server and filename.
    pub fn requires_auth(self) -> bool {
        self.is_network() && self != Location::Tftp
    }

    pub fn protocol(self) -> Option<TransferProtocol> {
        match self {
            Location::Running | Location::Startup => None,
            Location::Tftp => Some(TransferProtocol::Tftp),
            Location::Ftp => Some(TransferProtocol::Ftp),
            Location::Rcp => Some(TransferProtocol::Rcp),
            Location::Scp => Some(TransferProtocol::Scp),
            Location::Sftp => Some(TransferProtocol::Sftp),
        }
    }

    /// Projection onto the MIB's file-type column; every network
    /// location collapses to `NetworkFile`.
    pub fn file_type(self) -> ConfigFileType {
        match self {
            Location::Running => ConfigFileType::RunningConfig,
            Location::Startup => ConfigFileType::StartupConfig,
            Location::Tftp | Location::Ftp | Location::Rcp | Location::Scp | Location::Sftp => {
                ConfigFileType::NetworkFile
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Location::Running => "running",
            Location::Startup => "startup",
            Location::Tftp => "tftp",
            Location::Ftp => "ftp",
            Location::Rcp => "rcp",
            Location::Scp => "scp",
            Location::Sftp => "sftp",
        }
    }
}

impl FromStr for Location {
    type Err = CopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::ALL
            .into_iter()
            .find(|loc| loc.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CopyError::InvalidRequest(format!(
                    "must provide valid source and destination (got {s:?})"
                ))
            })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── CopyRequest ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub source: Location,
    pub destination: Location,
    pub server: Option<String>,
    pub filename: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub protocol: Option<Location>,
}

impl CopyRequest {
    pub fn new(source: Location, destination: Location) -> Self {
        Self {
            source,
            destination,
            server: None,
            filename: None,
            username: None,
            password: None,
            protocol: None,
        }
    }

    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn protocol(mut self, protocol: Location) -> Self {
        self.protocol = Some(protocol);
        self
    }

    fn endpoints(&self) -> [Location; 2] {
        [self.source, self.destination]
    }

    /// Check presence rules and project the endpoints.
    ///
    /// The server stays unresolved here; see [`resolve_server`].
    pub fn validate(&self) -> Result<ValidatedRequest, CopyError> {
        let needs_server = self.endpoints().iter().any(|l| l.is_network());
        let needs_auth = self.endpoints().iter().any(|l| l.requires_auth());

        let remote = if needs_server {
            let (Some(server), Some(filename)) = (&self.server, &self.filename) else {
                return Err(CopyError::InvalidRequest(
                    "missing server and/or filename".into(),
                ));
            };
            Some((server.clone(), filename.clone()))
        } else {
            None
        };

        let credentials = if needs_auth {
            let (Some(username), Some(password)) = (&self.username, &self.password) else {
                return Err(CopyError::InvalidRequest(
                    "missing username and/or password".into(),
                ));
            };
            Some((username.clone(), password.clone()))
        } else {
            None
        };

        // Source wins when both ends are network-class. A caller-supplied
        // protocol only applies to local-to-local copies.
        let protocol = self
            .source
            .protocol()
            .or_else(|| self.destination.protocol())
            .or_else(|| self.protocol.and_then(Location::protocol));

        Ok(ValidatedRequest {
            source: self.source.file_type(),
            destination: self.destination.file_type(),
            protocol,
            remote,
            credentials,
        })
    }
}

/// A request that passed presence checks, awaiting server resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    source: ConfigFileType,
    destination: ConfigFileType,
    protocol: Option<TransferProtocol>,
    remote: Option<(String, String)>,
    credentials: Option<(String, String)>,
}

impl ValidatedRequest {
    pub fn server(&self) -> Option<&str> {
        self.remote.as_ref().map(|(server, _)| server.as_str())
    }

    pub fn into_plan(self, server_addr: Option<Ipv4Addr>) -> Result<CopyPlan, CopyError> {
        let remote = match (self.remote, server_addr) {
            (Some((_, filename)), Some(addr)) => Some((addr, filename)),
            (Some((server, _)), None) => {
                return Err(CopyError::InvalidRequest(format!(
                    "server {server} has no IPv4 address"
                )));
            }
            (None, _) => None,
        };
        Ok(CopyPlan {
            source: self.source,
            destination: self.destination,
            protocol: self.protocol,
            remote,
            credentials: self.credentials,
        })
    }
}

/// Turn a server name or literal into the IPv4 address the
/// `ccCopyServerAddress` column carries.
pub async fn resolve_server(server: &str) -> Result<Ipv4Addr, CopyError> {
    match server.parse::<IpAddr>() {
        Ok(IpAddr::V4(addr)) => return Ok(addr),
        Ok(IpAddr::V6(addr)) => {
            return Err(CopyError::InvalidRequest(format!(
                "server {addr} is IPv6; only IPv4 servers are supported"
            )));
        }
        Err(_) => {}
    }
    let addrs = tokio::net::lookup_host((server, 0))
        .await
        .map_err(|e| CopyError::InvalidRequest(format!("cannot resolve server {server}: {e}")))?;
    addrs
        .filter_map(|a| match a.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| CopyError::InvalidRequest(format!("server {server} has no IPv4 address")))
}

// ── CopyPlan ─────────────────────────────────────────────────────

/// Everything needed to create the copy row, minus the row itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlan {
    source: ConfigFileType,
    destination: ConfigFileType,
    protocol: Option<TransferProtocol>,
    remote: Option<(Ipv4Addr, String)>,
    credentials: Option<(String, String)>,
}

impl CopyPlan {
    pub fn source(&self) -> ConfigFileType {
        self.source
    }

    pub fn destination(&self) -> ConfigFileType {
        self.destination
    }

    pub fn protocol(&self) -> Option<TransferProtocol> {
        self.protocol
    }

    /// The single Set that creates and starts the row. The row-status
    /// binding always comes last.
    pub fn bindings(&self, row: Row) -> Vec<VarBind> {
        let mut out = Vec::with_capacity(8);
        if let Some((addr, filename)) = &self.remote {
            out.push(mib::encode_server_address(row, *addr));
            out.push(mib::encode_filename(row, filename));
        }
        if let Some((username, password)) = &self.credentials {
            out.push(mib::encode_username(row, username));
            out.push(mib::encode_password(row, password));
        }
        out.push(mib::encode_source(row, self.source));
        out.push(mib::encode_destination(row, self.destination));
        if let Some(protocol) = self.protocol {
            out.push(mib::encode_protocol(row, protocol));
        }
        out.push(mib::encode_action(row, RowAction::CreateAndGo));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copy::mib::Column;
    use crate::snmp::Value;

    fn complete(loc_a: Location, loc_b: Location) -> CopyRequest {
        CopyRequest::new(loc_a, loc_b)
            .server("10.0.0.5")
            .filename("cfg.txt")
            .credentials("backup", "hunter2")
    }

    #[test]
    fn location_sets() {
        let network: Vec<_> = Location::ALL.into_iter().filter(|l| l.is_network()).collect();
        assert_eq!(
            network,
            [Location::Tftp, Location::Ftp, Location::Rcp, Location::Scp, Location::Sftp]
        );
        let auth: Vec<_> = Location::ALL.into_iter().filter(|l| l.requires_auth()).collect();
        assert_eq!(auth, [Location::Ftp, Location::Rcp, Location::Scp, Location::Sftp]);
        assert!(Location::Running.is_local() && Location::Startup.is_local());
    }

    #[test]
    fn parse_locations() {
        assert_eq!("TFTP".parse::<Location>().unwrap(), Location::Tftp);
        assert_eq!(" startup ".parse::<Location>().unwrap(), Location::Startup);
        assert!(matches!(
            "flash".parse::<Location>(),
            Err(CopyError::InvalidRequest(_))
        ));
    }

    #[test]
    fn every_network_location_needs_server_and_filename() {
        for loc in Location::ALL.into_iter().filter(|l| l.is_network()) {
            for (src, dst) in [(Location::Running, loc), (loc, Location::Startup)] {
                let no_server = CopyRequest {
                    server: None,
                    ..complete(src, dst)
                };
                assert!(matches!(no_server.validate(), Err(CopyError::InvalidRequest(_))));
                let no_file = CopyRequest {
                    filename: None,
                    ..complete(src, dst)
                };
                assert!(matches!(no_file.validate(), Err(CopyError::InvalidRequest(_))));
                assert!(complete(src, dst).validate().is_ok());
            }
        }
    }

    #[test]
    fn authenticated_locations_need_credentials() {
        for loc in Location::ALL.into_iter().filter(|l| l.requires_auth()) {
            let no_user = CopyRequest {
                username: None,
                ..complete(Location::Running, loc)
            };
            assert!(matches!(no_user.validate(), Err(CopyError::InvalidRequest(_))));
            let no_pass = CopyRequest {
                password: None,
                ..complete(loc, Location::Running)
            };
            assert!(matches!(no_pass.validate(), Err(CopyError::InvalidRequest(_))));
        }
    }

    #[test]
    fn tftp_needs_no_credentials() {
        let req = CopyRequest::new(Location::Startup, Location::Tftp)
            .server("10.0.0.5")
            .filename("cfg.txt");
        let plan = req
            .validate()
            .unwrap()
            .into_plan(Some(Ipv4Addr::new(10, 0, 0, 5)))
            .unwrap();
        assert_eq!(plan.destination(), ConfigFileType::NetworkFile);
        assert_eq!(plan.protocol(), Some(TransferProtocol::Tftp));

        let row = Row::new(321).unwrap();
        let bindings = plan.bindings(row);
        assert!(bindings.iter().all(|b| b.oid != Column::UserName.oid(row)));
        assert!(bindings.iter().all(|b| b.oid != Column::UserPassword.oid(row)));
    }

    #[test]
    fn local_copy_ignores_supplied_remote_fields() {
        let req = complete(Location::Running, Location::Startup);
        let plan = req.validate().unwrap().into_plan(None).unwrap();
        let row = Row::new(100).unwrap();
        let bindings = plan.bindings(row);
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[0].value, Value::Integer(4));
        assert_eq!(bindings[1].value, Value::Integer(3));
        assert_eq!(bindings[2].oid, Column::EntryRowStatus.oid(row));
        assert_eq!(bindings[2].value, Value::Integer(4));
    }

    #[test]
    fn source_protocol_wins_when_both_network() {
        let plan = complete(Location::Scp, Location::Tftp)
            .validate()
            .unwrap()
            .into_plan(Some(Ipv4Addr::LOCALHOST))
            .unwrap();
        assert_eq!(plan.protocol(), Some(TransferProtocol::Scp));
        assert_eq!(plan.source(), ConfigFileType::NetworkFile);
        assert_eq!(plan.destination(), ConfigFileType::NetworkFile);
        // server, filename, username, password once each
        assert_eq!(plan.bindings(Row::new(400).unwrap()).len(), 8);
    }

    #[test]
    fn explicit_protocol_only_for_local_copies() {
        let plan = CopyRequest::new(Location::Running, Location::Startup)
            .protocol(Location::Rcp)
            .validate()
            .unwrap()
            .into_plan(None)
            .unwrap();
        assert_eq!(plan.protocol(), Some(TransferProtocol::Rcp));

        let plan = CopyRequest::new(Location::Running, Location::Startup)
            .protocol(Location::Startup)
            .validate()
            .unwrap()
            .into_plan(None)
            .unwrap();
        assert_eq!(plan.protocol(), None);
    }

    #[test]
    fn unresolved_server_rejected() {
        let validated = CopyRequest::new(Location::Running, Location::Tftp)
            .server("tftp.example")
            .filename("r1.cfg")
            .validate()
            .unwrap();
        assert_eq!(validated.server(), Some("tftp.example"));
        assert!(matches!(
            validated.into_plan(None),
            Err(CopyError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn resolve_literal_addresses() {
        assert_eq!(
            resolve_server("192.0.2.7").await.unwrap(),
            Ipv4Addr::new(192, 0, 2, 7)
        );
        assert!(matches!(
            resolve_server("2001:db8::1").await,
            Err(CopyError::InvalidRequest(_))
        ));
    }
}
