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

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SCROLL_SPEED: f64 = 0.6;
pub const DEFAULT_IDLE_DELAY_MS: u64 = 5000;
pub const DEFAULT_IDLE_CHECK_MS: u64 = 1000;
pub const DEFAULT_WATCHDOG_INTERVAL_MS: u64 = 250;
pub const DEFAULT_WATCHDOG_THRESHOLD_MS: u64 = 400;
pub const DEFAULT_WRAP_SETTLE_MS: u64 = 32;
pub const DEFAULT_READINESS_POLL_MS: u64 = 100;
pub const DEFAULT_READINESS_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_READINESS_CANDIDATES: usize = 5;
pub const DEFAULT_ROW_HEIGHT: f64 = 40.0;
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;
pub const CLASSIC_THEME: &str = "tvguide1990";

const CONFIG_DIR_NAME: &str = "guide-autoscroll";
const CONFIG_FILE: &str = "config.json";

/// Tunables for [`crate::scroll::AutoScrollEngine`]. Every field has a
/// default so a config file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Drift step in pixels per animation frame.
    pub speed: f64,
    pub loop_mode: bool,
    /// Preference value assumed when nothing (or garbage) is stored.
    pub enabled_by_default: bool,
    pub idle_delay_ms: u64,
    pub idle_check_ms: u64,
    pub watchdog_interval_ms: u64,
    pub watchdog_threshold_ms: u64,
    pub wrap_settle_ms: u64,
    pub readiness_poll_ms: u64,
    pub readiness_timeout_ms: u64,
    pub readiness_candidates: usize,
    pub fallback_row_height: f64,
    /// Restart after an end-of-content stop once this much time has passed.
    /// `None` keeps drift parked until an explicit start.
    pub auto_restart_delay_ms: Option<u64>,
    pub frame_interval_ms: u64,
    /// Scroll container candidates, most specific first.
    pub selectors: Vec<String>,
    pub classic_theme: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SCROLL_SPEED,
            loop_mode: true,
            enabled_by_default: true,
            idle_delay_ms: DEFAULT_IDLE_DELAY_MS,
            idle_check_ms: DEFAULT_IDLE_CHECK_MS,
            watchdog_interval_ms: DEFAULT_WATCHDOG_INTERVAL_MS,
            watchdog_threshold_ms: DEFAULT_WATCHDOG_THRESHOLD_MS,
            wrap_settle_ms: DEFAULT_WRAP_SETTLE_MS,
            readiness_poll_ms: DEFAULT_READINESS_POLL_MS,
            readiness_timeout_ms: DEFAULT_READINESS_TIMEOUT_MS,
            readiness_candidates: DEFAULT_READINESS_CANDIDATES,
            fallback_row_height: DEFAULT_ROW_HEIGHT,
            auto_restart_delay_ms: None,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            selectors: vec!["#guideOuter".to_owned(), ".guide-outer".to_owned(), ".grid-col".to_owned()],
            classic_theme: CLASSIC_THEME.to_owned(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    #[must_use]
    pub fn idle_check(&self) -> Duration {
        Duration::from_millis(self.idle_check_ms)
    }

    #[must_use]
    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms)
    }

    #[must_use]
    pub fn watchdog_threshold(&self) -> Duration {
        Duration::from_millis(self.watchdog_threshold_ms)
    }

    #[must_use]
    pub fn wrap_settle(&self) -> Duration {
        Duration::from_millis(self.wrap_settle_ms)
    }

    #[must_use]
    pub fn readiness_poll(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_ms)
    }

    #[must_use]
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    #[must_use]
    pub fn auto_restart_delay(&self) -> Option<Duration> {
        self.auto_restart_delay_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(format!("speed must be a finite number above zero, got {}", self.speed));
        }
        if !self.fallback_row_height.is_finite() || self.fallback_row_height <= 0.0 {
            return Err("fallback_row_height must be above zero".to_owned());
        }
        if self.selectors.is_empty() {
            return Err("selectors must name at least one scroll container".to_owned());
        }
        if self.idle_check_ms == 0 || self.watchdog_interval_ms == 0 || self.readiness_poll_ms == 0 {
            return Err("timer periods must be non-zero".to_owned());
        }
        Ok(())
    }

    /// Load from an explicit path, or from the default location when it
    /// exists, or fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
        let config = Self::from_json(&content).map_err(|e| {
            tracing::error!("invalid config {}: {e}", path.display());
            anyhow::Error::new(AppError::ConfigInvalid)
        })?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE))
}
