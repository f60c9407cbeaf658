// # ddns6 - single-shot AAAA synchronizer
//
// The binary is a thin integration layer:
// 1. Read configuration from environment variables
// 2. Install the log file subscriber
// 3. Build the address sources, provider and cache store
// 4. Run one SyncEngine pass and exit
//
// Scheduling (cron, systemd timers, Task Scheduler) is external.
//
// ## Configuration
//
// - `DDNS6_API_TOKEN`: Cloudflare API token (required)
// - `DDNS6_ZONE`: Parent zone name, e.g. `example.com` (required)
// - `DDNS6_RECORD`: Record label below the zone, e.g. `api` (required)
// - `DDNS6_CACHE_PATH`: Id cache file (default: `ddns6.json` beside the executable)
// - `DDNS6_LOG_PATH`: Log file (default: `ddns6.log` beside the executable)
// - `DDNS6_LOG_LEVEL`: trace, debug, info, warn or error (default: info)
// - `DDNS6_API_BASE`: Cloudflare API base URL
// - `DDNS6_PROBE_TARGET`: IPv6 socket address used by the route probe
//
// ## Example
//
// ```bash
// export DDNS6_API_TOKEN=your_token
// export DDNS6_ZONE=example.com
// export DDNS6_RECORD=home
//
// ddns6
// ```
//
// ## Exit status
//
// Only a configuration error exits non-zero. Whatever happens during the
// run itself is written to the log file and the process exits 0.

use anyhow::{Context, Result};
use ddns6_core::config::{DEFAULT_API_BASE, DEFAULT_PROBE_TARGET};
use ddns6_core::{FileCacheStore, ManagedDomain, ProviderConfig, RunOutcome, SyncConfig, SyncEngine};
use ddns6_ip_socket::{SystemResolver, UdpProbeSource};
use ddns6_provider_cloudflare::CloudflareProvider;
use std::fs::{File, OpenOptions};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{Level, error, info, warn};

const CACHE_FILE_NAME: &str = "ddns6.json";
const LOG_FILE_NAME: &str = "ddns6.log";

/// Exit codes
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// The run happened, whatever its outcome
    Completed = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    api_token: String,
    zone: String,
    record: String,
    cache_path: PathBuf,
    log_path: PathBuf,
    log_level: String,
    api_base: String,
    probe_target: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_token", &"<REDACTED>")
            .field("zone", &self.zone)
            .field("record", &self.record)
            .field("cache_path", &self.cache_path)
            .field("log_path", &self.log_path)
            .field("log_level", &self.log_level)
            .field("api_base", &self.api_base)
            .field("probe_target", &self.probe_target)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let exe_dir = std::env::current_exe()
            .context("Cannot locate the executable for default file paths")?
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self::from_lookup(|key| std::env::var(key).ok(), &exe_dir)
    }

    /// Load configuration through `lookup`, defaulting file paths into `exe_dir`
    fn from_lookup<F>(lookup: F, exe_dir: &Path) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .with_context(|| format!("{} is required. Set it via: export {}=...", key, key))
        };

        Ok(Self {
            api_token: required("DDNS6_API_TOKEN")?,
            zone: required("DDNS6_ZONE")?,
            record: required("DDNS6_RECORD")?,
            cache_path: lookup("DDNS6_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| exe_dir.join(CACHE_FILE_NAME)),
            log_path: lookup("DDNS6_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| exe_dir.join(LOG_FILE_NAME)),
            log_level: lookup("DDNS6_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            api_base: lookup("DDNS6_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            probe_target: lookup("DDNS6_PROBE_TARGET")
                .unwrap_or_else(|| DEFAULT_PROBE_TARGET.to_string()),
        })
    }

    /// Validate the configuration and build the engine configuration
    fn validate(&self) -> Result<SyncConfig> {
        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower == "token"
        {
            anyhow::bail!(
                "DDNS6_API_TOKEN appears to be a placeholder. \
                Use an API token with Zone:Read and DNS:Edit permissions."
            );
        }

        self.level()?;

        let probe_target: SocketAddr = self.probe_target.parse().with_context(|| {
            format!(
                "DDNS6_PROBE_TARGET '{}' is not a socket address, e.g. {}",
                self.probe_target, DEFAULT_PROBE_TARGET
            )
        })?;

        let sync = SyncConfig::new(
            ManagedDomain::new(&self.record, &self.zone),
            ProviderConfig::new(&self.api_token).with_api_base(&self.api_base),
            &self.cache_path,
        )
        .with_probe_target(probe_target);

        sync.validate()?;
        Ok(sync)
    }

    /// Parsed log level
    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DDNS6_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber: the log file if it opens, stderr otherwise
fn init_tracing(path: &Path, level: Level) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false);

    match open_log_file(path) {
        Ok(file) => builder
            .with_writer(Mutex::new(file))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e)),
        Err(e) => {
            eprintln!(
                "Cannot open log file {}: {}. Logging to stderr.",
                path.display(),
                e
            );
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
        }
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let sync_config = match config.validate() {
        Ok(sync) => sync,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let level = config.level().unwrap_or(Level::INFO);
    if let Err(e) = init_tracing(&config.log_path, level) {
        eprintln!("{:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("ddns6 {} starting for {}", env!("CARGO_PKG_VERSION"), sync_config.domain);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::Completed.into();
        }
    };

    if let Err(e) = rt.block_on(run(&sync_config)) {
        error!("{:#}", e);
    }

    DdnsExitCode::Completed.into()
}

/// Wire up the collaborators and run one pass
async fn run(config: &SyncConfig) -> Result<()> {
    let ip_source = UdpProbeSource::new(config.probe_target)?;
    let provider = CloudflareProvider::new(&config.provider)?;
    let cache = FileCacheStore::new(&config.cache_path);

    let engine = SyncEngine::new(
        config,
        Box::new(ip_source),
        Box::new(SystemResolver::new()),
        Box::new(provider),
        Box::new(cache),
    )?;

    match engine.run_once().await {
        RunOutcome::InSync { address } => info!("Done: in sync at {}", address),
        RunOutcome::Created { record_id, .. } => info!("Done: created record {}", record_id),
        RunOutcome::Updated { record_id } => info!("Done: updated record {}", record_id),
        outcome => warn!("Done without publishing: {:?}", outcome),
    }

    Ok(())
}
