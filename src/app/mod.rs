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

mod events;
pub mod guide;
mod state;

pub use events::{describe_event, handle_terminal_event};
pub use guide::{Channel, GuideDocument, GuideListing};
pub use state::{App, HostEngine, HostPrefs};

use crate::Cli;
use crate::config::EngineConfig;
use crate::error::AppError;
use crate::scroll::prefs::THEME_PREF_KEY;
use crate::scroll::{JsonFileStore, MemoryStore, PreferenceStore as _};
use crossterm::event::EventStream;
use futures::{FutureExt as _, StreamExt};
use ratatui::layout::Rect;
use std::time::Duration;

/// Upper bound on how long the loop sleeps with nothing scheduled.
const MAX_IDLE_WAIT: Duration = Duration::from_millis(250);
const FALLBACK_SCREEN: (u16, u16) = (80, 24);

/// Build the host from CLI flags: listing, preference store, theme and
/// engine overrides. No terminal I/O happens here.
pub fn create_app(cli: &Cli, mut config: EngineConfig) -> anyhow::Result<App> {
    if let Some(speed) = cli.speed {
        config.speed = speed;
    }
    if cli.no_loop {
        config.loop_mode = false;
    }
    if let Err(err) = config.validate() {
        tracing::error!("invalid engine overrides: {err}");
        return Err(anyhow::Error::new(AppError::ConfigInvalid));
    }

    let listing = match cli.guide.as_deref() {
        Some(path) => GuideListing::load(path)?,
        None => GuideListing::demo(),
    };

    let mut prefs = match cli.prefs.clone().or_else(JsonFileStore::default_path) {
        Some(path) => HostPrefs::File(JsonFileStore::open(&path)),
        None => {
            tracing::warn!("no config directory, preferences will not persist");
            HostPrefs::Memory(MemoryStore::new())
        }
    };
    if let Some(theme) = cli.theme.as_deref()
        && let Err(err) = prefs.set(THEME_PREF_KEY, theme)
    {
        tracing::warn!("theme not persisted: {err}");
    }

    let (width, height) = crossterm::terminal::size().unwrap_or(FALLBACK_SCREEN);
    Ok(App::new(&listing, prefs, config, Rect::new(0, 0, width, height)))
}

pub async fn run_tui(app: &mut App) -> anyhow::Result<()> {
    let mut terminal = ratatui::try_init().map_err(|err| {
        tracing::error!("terminal init failed: {err}");
        anyhow::Error::new(AppError::TerminalUnavailable)
    })?;

    // Mouse and focus reporting (ignore error on unsupported terminals)
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::EnableMouseCapture,
        crossterm::event::EnableFocusChange,
    );

    let size = terminal.size()?;
    app.sync_viewport(Rect::new(0, 0, size.width, size.height));
    app.engine.init();

    let mut events = EventStream::new();
    let result = loop {
        // Phase 1: wait for a terminal event or the next engine deadline
        let wait = app.time_to_next_task().map_or(MAX_IDLE_WAIT, |d| d.min(MAX_IDLE_WAIT));
        tokio::select! {
            Some(Ok(event)) = events.next() => {
                handle_terminal_event(app, event);
            }
            () = tokio::time::sleep(wait) => {}
        }

        // Phase 2: drain queued terminal events
        while let Some(Some(Ok(event))) = events.next().now_or_never() {
            handle_terminal_event(app, event);
        }

        // Phase 3: run due engine tasks, then render once
        app.engine.run_due();
        events::drain_engine_events(app);
        if app.should_quit {
            break Ok(());
        }
        if let Err(err) = terminal.draw(|f| crate::ui::render(f, app)) {
            break Err(anyhow::Error::from(err));
        }
    };

    app.engine.teardown();
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::DisableMouseCapture,
        crossterm::event::DisableFocusChange,
    );
    ratatui::restore();
    result
}
