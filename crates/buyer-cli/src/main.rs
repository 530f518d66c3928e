//! `buyer` - runs the storefront purchase flow once in a real browser.
//!
//! Usage: `buyer [--headed] [--config <path>]`
//!
//! Exit codes: 0 when the flow completes, 2 when a human has to solve the
//! challenge, 1 on any other failure.

use anyhow::{bail, Context, Result};
use buyer_browser::BrowserEngine;
use buyer_core::AppConfig;
use buyer_flow::{FlowOutcome, PurchaseFlow};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

/// Command-line options.
#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    headed: bool,
    config: Option<PathBuf>,
}

fn parse_args<I>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--headed" => parsed.headed = true,
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            other => bail!("unknown argument: {other} (usage: buyer [--headed] [--config <path>])"),
        }
    }
    Ok(parsed)
}

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,buyer=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

fn exit_status(outcome: &FlowOutcome) -> u8 {
    if outcome.is_success() {
        0
    } else if outcome.requires_user_action() {
        2
    } else {
        1
    }
}

async fn run(args: CliArgs) -> Result<FlowOutcome> {
    let mut config = AppConfig::load_with_env(args.config.as_deref())
        .context("failed to load configuration")?;
    if args.headed {
        config.browser.headless = false;
    }

    let engine = BrowserEngine::with_config(&config.browser)
        .await
        .context("failed to launch browser")?;

    let outcome = PurchaseFlow::from_config(&config).run(&engine).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    // Leave the window open so the operator can solve the challenge
    if outcome.requires_user_action() && !config.browser.headless {
        info!("Solve the challenge in the browser window, then press Ctrl-C");
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")?;
    }

    if let Err(e) = engine.close().await {
        warn!("Failed to close browser: {}", e);
    }
    Ok(outcome)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    info!("Starting buyer v{}", env!("CARGO_PKG_VERSION"));

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(outcome) => ExitCode::from(exit_status(&outcome)),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
