//! DeployHook CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration** — flags and environment via `clap`, then the
//!    optional TOML file (see [`config`]).
//! 2. **Wire observability** — `tracing-subscriber` with a pretty or JSON
//!    layer, plus an OpenTelemetry OTLP exporter when an endpoint is set.
//! 3. **Construct infrastructure** — a `DataBagClient` store and a
//!    `KnifeSshExecutor`, injected into one [`deploy::Invocation`].
//! 4. **Run once** — read the `tf_*` variables, run the invocation, and map
//!    the outcome to the process exit code (0 on success, 1 otherwise).

mod config;
mod telemetry;

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use databag::DataBagClient;
use deploy::{DeployError, Invocation, NotificationFieldSet};
use remote::KnifeSshExecutor;
use tracing::{error, info};

use crate::config::{AppConfig, Cli};
use crate::telemetry::Telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_cli(std::env::args_os()) {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    let telemetry = match Telemetry::init(cli.log_format, cli.otlp_endpoint.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("deploy-hook: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let code = match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<DeployError>() {
            Some(deploy_error @ DeployError::Configuration { .. }) => {
                error!(error = %deploy_error, "invalid configuration");
                ExitCode::from(deploy_error.exit_code())
            }
            // The invocation has already logged it, with the stage it stopped in.
            Some(deploy_error) => ExitCode::from(deploy_error.exit_code()),
            None => {
                error!(error = %format!("{e:#}"), "deploy-hook could not start");
                ExitCode::FAILURE
            }
        },
    };

    telemetry.shutdown().await;
    code
}

/// Parses the command line and environment.
///
/// `--help` and `--version` print and exit successfully; every other parse
/// failure is printed and mapped to exit code 1.
fn parse_cli<I, T>(args: I) -> Result<Cli, ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
        _ => {
            let _ = e.print();
            ExitCode::FAILURE
        }
    })
}

async fn run(cli: &Cli) -> Result<()> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let config = AppConfig::load(cli, home.as_deref())?;

    let store = DataBagClient::new(&config.store)?;
    let executor = KnifeSshExecutor::new(&config.knife);
    let fields = NotificationFieldSet::from_vars(
        std::env::vars_os().filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
    );

    let invocation = Invocation::new(&config.settings, &store, &executor);
    info!(invocation_id = %invocation.id(), container = %config.settings.container, "deploy-hook starting");
    let report = invocation.run(&fields).await?;

    if config.echo_remote_output {
        print!("{}", report.execution.stdout);
    }
    Ok(())
}
