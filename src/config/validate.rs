// src/config/validate.rs

use std::net::SocketAddr;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WipeguardError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::WipeguardError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let bind_addr = validate_server(&raw)?;
        validate_jobs(&raw)?;
        validate_disks(&raw)?;
        Ok(ConfigFile::new_unchecked(raw, bind_addr))
    }
}

fn validate_server(cfg: &RawConfigFile) -> Result<SocketAddr> {
    cfg.server.bind.parse::<SocketAddr>().map_err(|e| {
        WipeguardError::ConfigError(format!(
            "[server].bind '{}' is not a valid socket address: {e}",
            cfg.server.bind
        ))
    })
}

fn validate_jobs(cfg: &RawConfigFile) -> Result<()> {
    let jobs = &cfg.jobs;

    if jobs.wipe.program.trim().is_empty() {
        return Err(WipeguardError::ConfigError(
            "[jobs.wipe].program must not be empty".to_string(),
        ));
    }
    if jobs.factory_reset.program.trim().is_empty() {
        return Err(WipeguardError::ConfigError(
            "[jobs.factory_reset].program must not be empty".to_string(),
        ));
    }
    if jobs.elevate.iter().any(|part| part.trim().is_empty()) {
        return Err(WipeguardError::ConfigError(
            "[jobs].elevate must not contain empty arguments".to_string(),
        ));
    }
    // Multi-line confirmations would desync the prompts of the reset tool.
    if jobs.factory_reset.confirm.contains('\n') {
        return Err(WipeguardError::ConfigError(
            "[jobs.factory_reset].confirm must be a single line".to_string(),
        ));
    }

    Ok(())
}

fn validate_disks(cfg: &RawConfigFile) -> Result<()> {
    match cfg.disks.command.first() {
        Some(program) if !program.trim().is_empty() => Ok(()),
        _ => Err(WipeguardError::ConfigError(
            "[disks].command must name a program".to_string(),
        )),
    }
}
