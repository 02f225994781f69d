//! Command-line arguments and the optional TOML configuration file.
//!
//! Precedence, highest first: flag or environment variable, config file,
//! built-in default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use databag::DataBagConfig;
use deploy::{ContainerName, DeploySettings, FlexFieldNames, RemoteCommand};
use serde::Deserialize;

/// Config file looked up under `$HOME` when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = ".deploy-hook/config.toml";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_KNIFE: &str = "knife";

/// Record a tracker release against its target host and kick a
/// configuration-management run there.
///
/// Tracker fields are read from `tf_*` environment variables.
#[derive(Debug, Parser)]
#[command(name = "deploy-hook", version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "DEPLOY_HOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the data-bag store.
    #[arg(long, env = "DEPLOY_HOOK_STORE_URL")]
    pub store_url: Option<String>,

    /// Bearer token for the data-bag store.
    #[arg(long, env = "DEPLOY_HOOK_STORE_TOKEN", hide_env_values = true)]
    pub store_token: Option<String>,

    /// Log output format.
    #[arg(long, env = "DEPLOY_HOOK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; spans are exported when set.
    #[arg(long, env = "DEPLOY_HOOK_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Print the remote run's output after it succeeds.
    ///
    /// Any `DEBUG` value other than `0`, `false`, `no`, `off` or empty enables it.
    #[arg(long, env = "DEBUG", value_parser = clap::builder::FalseyValueParser::new())]
    pub debug: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    store: StoreSection,
    deploy: DeploySection,
    remote: RemoteSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StoreSection {
    url: Option<String>,
    token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DeploySection {
    container: Option<String>,
    status: Option<String>,
    target_field: Option<String>,
    release_field: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RemoteSection {
    knife: Option<PathBuf>,
    query: Option<String>,
    command: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Settings handed to the domain.
    pub settings: DeploySettings,
    /// Store connection.
    pub store: DataBagConfig,
    /// `knife` binary used for remote runs.
    pub knife: PathBuf,
    /// Echo remote stdout after success.
    pub echo_remote_output: bool,
}

impl AppConfig {
    /// Resolves the configuration from `cli`, the config file, and defaults.
    ///
    /// `home` locates the default config file; pass `None` to skip it.
    pub fn load(cli: &Cli, home: Option<&Path>) -> Result<Self> {
        let file = match (&cli.config, home) {
            (Some(path), _) => read_file(path)?,
            (None, Some(home)) => {
                let path = home.join(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    read_file(&path)?
                } else {
                    ConfigFile::default()
                }
            }
            (None, None) => ConfigFile::default(),
        };
        Self::resolve(cli, file)
    }

    fn resolve(cli: &Cli, file: ConfigFile) -> Result<Self> {
        let defaults = DeploySettings::default();

        let container = match file.deploy.container {
            Some(name) => ContainerName::new(name).context("deploy.container must not be empty")?,
            None => defaults.container,
        };
        let settings = DeploySettings {
            container,
            deploy_status: file.deploy.status.unwrap_or(defaults.deploy_status),
            flex_fields: FlexFieldNames {
                target_host: file
                    .deploy
                    .target_field
                    .unwrap_or(defaults.flex_fields.target_host),
                release_id: file
                    .deploy
                    .release_field
                    .unwrap_or(defaults.flex_fields.release_id),
            },
            remote: RemoteCommand {
                query_template: file.remote.query.unwrap_or(defaults.remote.query_template),
                command: file.remote.command.unwrap_or(defaults.remote.command),
            },
        };
        settings.validate()?;

        let Some(base_url) = cli.store_url.clone().or(file.store.url) else {
            bail!("no store URL configured; set --store-url, DEPLOY_HOOK_STORE_URL or [store] url");
        };
        let store = DataBagConfig {
            base_url,
            token: cli.store_token.clone().or(file.store.token),
            timeout: Duration::from_secs(file.store.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        };

        Ok(Self {
            settings,
            store,
            knife: file.remote.knife.unwrap_or_else(|| PathBuf::from(DEFAULT_KNIFE)),
            echo_remote_output: cli.debug,
        })
    }
}

fn read_file(path: &Path) -> Result<ConfigFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config file {}", path.display()))
}
