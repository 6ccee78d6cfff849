use std::{fs, io, path::PathBuf, time::Duration};

use anyhow::{bail, Context};
use clap::Parser;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = client_core::DEFAULT_UPLOAD_TIMEOUT.as_secs();
pub const DEFAULT_CONFIG_PATH: &str = "retina.toml";

#[derive(Parser, Debug, Default)]
#[command(about = "Diabetic retinopathy classification desktop client")]
pub struct Args {
    /// Base URL of the classification service.
    #[arg(long)]
    pub server_url: Option<String>,
    /// Seconds to wait for a classification response before giving up.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartupConfig {
    pub server_url: Url,
    pub upload_timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    server_url: Option<String>,
    upload_timeout_secs: Option<u64>,
}

/// Defaults, then the config file, then `RETINA_*` environment variables, then flags.
pub fn load_startup_config(args: &Args) -> anyhow::Result<StartupConfig> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == io::ErrorKind::NotFound && args.config.is_none() => None,
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };
    resolve_startup_config(raw.as_deref(), |name| std::env::var(name).ok(), args)
        .with_context(|| format!("invalid configuration (config file '{}')", path.display()))
}

fn resolve_startup_config(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
    args: &Args,
) -> anyhow::Result<StartupConfig> {
    let file_cfg = match file {
        Some(raw) => toml::from_str::<FileConfig>(raw).context("config file is not valid TOML")?,
        None => FileConfig::default(),
    };

    let mut server_url = DEFAULT_SERVER_URL.to_string();
    let mut timeout_secs = DEFAULT_UPLOAD_TIMEOUT_SECS;

    if let Some(v) = file_cfg.server_url {
        server_url = v;
    }
    if let Some(v) = file_cfg.upload_timeout_secs {
        timeout_secs = v;
    }

    if let Some(v) = env("RETINA_SERVER_URL") {
        server_url = v;
    }
    if let Some(v) = env("RETINA_UPLOAD_TIMEOUT_SECS") {
        timeout_secs = v
            .trim()
            .parse()
            .with_context(|| format!("RETINA_UPLOAD_TIMEOUT_SECS must be a number, got '{v}'"))?;
    }

    if let Some(v) = &args.server_url {
        server_url = v.clone();
    }
    if let Some(v) = args.timeout_secs {
        timeout_secs = v;
    }

    if timeout_secs == 0 {
        bail!("upload timeout must be at least one second");
    }

    Ok(StartupConfig {
        server_url: parse_server_url(&server_url)?,
        upload_timeout: Duration::from_secs(timeout_secs),
    })
}

fn parse_server_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid server url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("server url must use http or https, got '{}'", url.scheme());
    }
    Ok(url)
}
