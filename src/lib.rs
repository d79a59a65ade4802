// src/lib.rs

pub mod cli;
pub mod config;
pub mod disks;
pub mod errors;
pub mod exec;
pub mod http;
pub mod job;
pub mod journal;
pub mod logging;
pub mod orchestrator;
pub mod progress;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_raw_or_default, ConfigFile};
use crate::exec::CommandRunner;
use crate::http::{build_router, AppState};
use crate::journal::open_journal;
use crate::orchestrator::Orchestrator;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (+ CLI / `PORT` overrides)
/// - the live-status journal
/// - the orchestrator with the real process runner
/// - the HTTP server
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = effective_config(&args)?;

    if args.dry_run {
        print_dry_run(&cfg)?;
        return Ok(());
    }

    let journal = open_journal(&cfg.journal)?;
    let runner = Arc::new(CommandRunner::new());
    let orchestrator = Arc::new(Orchestrator::new(cfg.jobs.clone(), journal, runner));

    let app = build_router(AppState::new(orchestrator, cfg.disks.command.clone()));

    let addr = cfg.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    http::serve(listener, app, shutdown_signal()).await
}

/// Load the config file (or defaults) and apply overrides, lowest priority
/// first: file, `PORT` env var, CLI flags.
fn effective_config(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = load_raw_or_default(&args.config)
        .with_context(|| format!("loading config from {:?}", args.config))?;

    if let Ok(port) = std::env::var("PORT") {
        raw.server.bind = with_port(&raw.server.bind, port.trim());
    }
    if let Some(bind) = &args.bind {
        raw.server.bind = bind.clone();
    }
    if let Some(dir) = &args.journal_dir {
        raw.journal.dir = dir.clone();
    }

    let cfg = ConfigFile::try_from(raw).context("validating config")?;
    debug!(?cfg, "effective configuration");
    Ok(cfg)
}

/// Replace the port of a `host:port` string.
fn with_port(bind: &str, port: &str) -> String {
    match bind.rsplit_once(':') {
        Some((host, _)) => format!("{host}:{port}"),
        None => format!("{bind}:{port}"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// Dry-run output: the effective configuration as TOML.
fn print_dry_run(cfg: &ConfigFile) -> Result<()> {
    println!("wipeguard dry-run");
    println!("  listen = {}", cfg.bind_addr());
    println!();
    println!("{}", toml::to_string_pretty(cfg).context("rendering config")?);

    debug!("dry-run complete (no server started)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_override_keeps_host() {
        assert_eq!(with_port("127.0.0.1:5000", "8080"), "127.0.0.1:8080");
        assert_eq!(with_port("[::1]:5000", "9"), "[::1]:9");
        assert_eq!(with_port("localhost", "1"), "localhost:1");
    }
}
