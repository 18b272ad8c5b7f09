// guide-autoscroll - Drifting auto-scroll engine for retro channel guides
// Copyright (C) 2025  Simon Peter Rothgang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use guide_autoscroll::Cli;
use guide_autoscroll::config::EngineConfig;
use guide_autoscroll::error::AppError;
use std::fs::OpenOptions;
use std::io::IsTerminal as _;

#[allow(clippy::exit)]
fn main() {
    if let Err(err) = run() {
        if let Some(app_error) = extract_app_error(&err) {
            eprintln!("{}", app_error.user_message());
            std::process::exit(app_error.exit_code());
        }
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let config = EngineConfig::load(cli.config.as_deref())?;
    let mut app = guide_autoscroll::app::create_app(&cli, config)?;

    if cli.dump_status {
        app.engine.init();
        println!("{}", serde_json::to_string_pretty(&app.engine.debug())?);
        return Ok(());
    }

    if !std::io::stdout().is_terminal() {
        return Err(anyhow::Error::new(AppError::TerminalUnavailable));
    }

    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    rt.block_on(guide_autoscroll::app::run_tui(&mut app))
}

fn extract_app_error(err: &anyhow::Error) -> Option<AppError> {
    err.chain().find_map(|cause| cause.downcast_ref::<AppError>().cloned())
}

/// Engine chatter at debug, everything else (crossterm, tokio) at warn.
const DEFAULT_LOG_FILTER: &str = "guide_autoscroll=debug,warn";
const LOG_ENV: &str = "GUIDE_AUTOSCROLL_LOG";

/// `--log-filter` wins over `GUIDE_AUTOSCROLL_LOG`, which wins over `RUST_LOG`.
fn log_directives(flag: Option<&str>, env: impl Fn(&str) -> Option<String>) -> String {
    flag.map(str::to_owned)
        .or_else(|| env(LOG_ENV))
        .or_else(|| env("RUST_LOG"))
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned())
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let Some(path) = cli.log_file.as_ref() else {
        if std::env::var_os(LOG_ENV).is_some() || std::env::var_os("RUST_LOG").is_some() {
            eprintln!("log filter set but no --log-file <PATH> given; the guide draws over stderr");
        }
        return Ok(());
    };

    let directives = log_directives(cli.log_filter.as_deref(), |key| std::env::var(key).ok());
    let filter = tracing_subscriber::EnvFilter::try_new(&directives)
        .map_err(|e| anyhow::anyhow!("invalid log filter `{directives}`: {e}"))?;

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(cli.log_append)
        .truncate(!cli.log_append)
        .open(path)
        .map_err(|e| anyhow::anyhow!("cannot open log file {}: {e}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing subscriber already set: {e}"))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        filter = %directives,
        speed = ?cli.speed,
        no_loop = cli.no_loop,
        "guide-autoscroll logging to {}",
        path.display()
    );
    Ok(())
}
