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

use crate::scroll::dom::NodeId;

/// Host-level failures that end the process with a dedicated exit code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("Engine configuration is invalid")]
    ConfigInvalid,
    #[error("Guide listing is invalid")]
    GuideInvalid,
    #[error("Terminal is unavailable")]
    TerminalUnavailable,
}

impl AppError {
    pub const CONFIG_INVALID_EXIT_CODE: i32 = 20;
    pub const GUIDE_INVALID_EXIT_CODE: i32 = 21;
    pub const TERMINAL_UNAVAILABLE_EXIT_CODE: i32 = 22;

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigInvalid => Self::CONFIG_INVALID_EXIT_CODE,
            Self::GuideInvalid => Self::GUIDE_INVALID_EXIT_CODE,
            Self::TerminalUnavailable => Self::TERMINAL_UNAVAILABLE_EXIT_CODE,
        }
    }

    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ConfigInvalid => {
                "The engine config file could not be parsed. Check the JSON against the documented keys."
            }
            Self::GuideInvalid => "The guide listing file could not be parsed or has no channels.",
            Self::TerminalUnavailable => {
                "No interactive terminal available. Use --dump-status for a headless run."
            }
        }
    }
}

/// Engine-internal failures. None of these escape a public engine operation;
/// they are logged at the boundary and the operation degrades to a no-op.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScrollError {
    #[error("no scrollable element matched any of {selectors:?}")]
    NoScrollTarget { selectors: Vec<String> },
    #[error("scroll target has no guide rows")]
    NoRows,
    #[error("rows of this target are already cloned")]
    AlreadyCloned,
    #[error("scroll speed must be a finite number above zero, got {0}")]
    InvalidSpeed(f64),
    #[error("node {0:?} is not part of the document")]
    UnknownNode(NodeId),
    #[error("preference store unavailable: {0}")]
    PreferenceStore(String),
    #[error("malformed preference value {0:?}")]
    MalformedPreference(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            AppError::ConfigInvalid.exit_code(),
            AppError::GuideInvalid.exit_code(),
            AppError::TerminalUnavailable.exit_code(),
        ];
        assert_eq!(codes, [20, 21, 22]);
    }

    #[test]
    fn invalid_speed_message_names_value() {
        let msg = ScrollError::InvalidSpeed(-1.0).to_string();
        assert!(msg.contains("-1"));
    }
}
