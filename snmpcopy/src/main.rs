//! snmpcopy — entry point.
//!
//! ```text
//! snmpcopy copy <src> <dst> [--server S --filename F ...]
//! snmpcopy get <oid>...
//! snmpcopy info
//! snmpcopy --config <path>      Load a custom config TOML
//! snmpcopy --gen-config         Write default config to stdout
//! ```

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use snmpcopy_core::{CopyError, Device};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use snmpcopy::cli::{Cli, Command, CopyArgs, parse_oids};
use snmpcopy::config::CopyConfig;

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&CopyConfig::default())?;
        println!("{text}");
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::FAILURE);
    };

    let mut config = CopyConfig::load(&cli.config);
    config.apply(cli.overrides());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("snmpcopy v{}", env!("CARGO_PKG_VERSION"));

    let target = config.to_target()?;
    info!("device: {}", target.key());
    let policy = config.poll;
    let device = Device::new(target).configure(|o| o.with_poll_policy(policy));

    let succeeded = match command {
        Command::Copy(args) => run_copy(&device, args).await?,
        Command::Get { oids } => {
            for binding in device.get(&parse_oids(oids)?).await? {
                println!("{binding}");
            }
            true
        }
        Command::Info => {
            println!("{}", device.system_description().await?);
            println!("{}", device.system_name().await?);
            true
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_copy(device: &Device, args: &CopyArgs) -> Result<bool, CopyError> {
    let request = args.to_request()?;

    // Ctrl-C handler.
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received; cancelling copy");
                cancel.cancel();
            }
        }
    });

    let report = device.copy_until(&request, &cancel).await?;
    println!("{report}");
    Ok(report.is_success())
}
