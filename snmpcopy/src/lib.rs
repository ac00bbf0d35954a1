//! # snmpcopy — configuration copy tool
//!
//! Thin command-line front end over `snmpcopy-core`: loads a TOML
//! config, applies command-line overrides, and runs one of
//!
//! - **copy**: move a configuration between running, startup and a
//!   file server, printing `snmp copy result: <name>`.
//! - **get**: read arbitrary object identifiers.
//! - **info**: print `sysDescr` and `sysName`.

pub mod cli;
pub mod config;
