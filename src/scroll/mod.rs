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

//! Guide auto-scroll: target resolution, seamless looping and the drift
//! state machine, written against small capability traits so the same
//! engine runs in tests and behind the terminal host.

pub mod dom;
pub mod engine;
pub mod looping;
pub mod memory_dom;
pub mod prefs;
pub mod readiness;
pub mod scheduler;
pub mod target;

pub use dom::{GuideDom, InsertPosition, NodeId};
pub use engine::{
    AutoScrollEngine, DebugSnapshot, DriftPhase, DriftState, EngineEvent, InteractionEvent,
    InteractionKind, ScrollStatus, StopReason,
};
pub use looping::CloneOutcome;
pub use memory_dom::{Element, MemoryDom};
pub use prefs::{JsonFileStore, MemoryStore, PreferenceStore, ScrollPreference};
pub use scheduler::{Clock, ManualClock, Scheduler, SystemClock, Task, TimerQueue, TimerToken};
pub use target::ScrollTarget;
