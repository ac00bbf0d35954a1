//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use snmpcopy_core::{CopyError, CopyRequest, Location, Oid};

use crate::config::Overrides;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "snmpcopy",
    version,
    about = "Back up and restore Cisco device configurations over SNMP"
)]
pub struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "snmpcopy.toml")]
    pub config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    pub gen_config: bool,

    /// Device hostname or address.
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// SNMPv2c community.
    #[arg(long, global = true)]
    pub community: Option<String>,

    /// Device SNMP port.
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Local address to send requests from.
    #[arg(long, global = true)]
    pub source_address: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy a configuration between two locations.
    Copy(CopyArgs),

    /// Read one or more object identifiers.
    Get {
        #[arg(required = true)]
        oids: Vec<String>,
    },

    /// Print the device's sysDescr and sysName.
    Info,
}

#[derive(Args, Debug)]
pub struct CopyArgs {
    /// running, startup, tftp, ftp, rcp, scp or sftp.
    pub source: String,
    pub destination: String,

    /// File server for network locations.
    #[arg(long)]
    pub server: Option<String>,

    /// Path on the file server.
    #[arg(long)]
    pub filename: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// Transfer protocol for local-to-local copies.
    #[arg(long)]
    pub protocol: Option<String>,
}

// ── Conversions ──────────────────────────────────────────────────

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            community: self.community.clone(),
            port: self.port,
            source_address: self.source_address.clone(),
        }
    }
}

impl CopyArgs {
    pub fn to_request(&self) -> Result<CopyRequest, CopyError> {
        let mut request = CopyRequest::new(self.source.parse()?, self.destination.parse()?);
        request.server = self.server.clone();
        request.filename = self.filename.clone();
        request.username = self.username.clone();
        request.password = self.password.clone();
        request.protocol = self
            .protocol
            .as_deref()
            .map(str::parse::<Location>)
            .transpose()?;
        Ok(request)
    }
}

pub fn parse_oids(raw: &[String]) -> Result<Vec<Oid>, CopyError> {
    raw.iter().map(|s| s.parse()).collect()
}

// ── Tests ────────────────────────────────────────────────────────
