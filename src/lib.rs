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

pub mod app;
pub mod config;
pub mod error;
pub mod scroll;
pub mod ui;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "guide-autoscroll",
    version,
    about = "Drifting auto-scroll for a retro channel guide, in your terminal"
)]
pub struct Cli {
    /// Engine config file (JSON). Defaults to the user config directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Guide listing (JSON). A built-in demo lineup is used when omitted.
    #[arg(long, value_name = "PATH")]
    pub guide: Option<PathBuf>,

    /// Preference store (JSON). Defaults to the user config directory.
    #[arg(long, value_name = "PATH")]
    pub prefs: Option<PathBuf>,

    /// Drift speed in pixels per frame, overrides the config file
    #[arg(long)]
    pub speed: Option<f64>,

    /// Stop at the bottom instead of looping
    #[arg(long)]
    pub no_loop: bool,

    /// Theme to apply at startup (e.g. `tvguide1990`)
    #[arg(long)]
    pub theme: Option<String>,

    /// Write tracing diagnostics to a file (disabled unless explicitly set).
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Tracing filter directives (example: `info,guide_autoscroll::scroll=debug`).
    /// Falls back to `GUIDE_AUTOSCROLL_LOG`, then `RUST_LOG`, then
    /// `guide_autoscroll=debug,warn`.
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,

    /// Append to `--log-file` instead of truncating on startup.
    #[arg(long)]
    pub log_append: bool,

    /// Initialise the engine headlessly, print its debug snapshot as JSON and exit.
    #[arg(long)]
    pub dump_status: bool,
}
