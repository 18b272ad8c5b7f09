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

//! Cooperative timer primitives: animation frames, one-shot timeouts and
//! fixed intervals, all driven by the host loop.
//!
//! Nothing here runs callbacks. The host asks [`Scheduler::pop_due`] for the
//! next due [`Task`] and hands it to the engine, which keeps the engine free
//! of self-borrowing closures and makes time fully injectable.

use serde::Serialize;
use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time since an unspecified origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock for the interactive host.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-advanced clock. Clones share the same time source.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Move to `at`; moving backwards is ignored.
    pub fn set(&self, at: Duration) {
        if at > self.now.get() {
            self.now.set(at);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Work items the engine schedules for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Task {
    /// Animation-frame callback (drift step).
    Frame,
    /// Backstop for throttled animation frames.
    Watchdog,
    /// Periodic idle-resume check.
    IdleCheck,
    /// One-shot start once the initial idle delay has passed.
    InitialStart,
    /// Resume the frame loop after a wrap jump settled.
    WrapResume,
    /// Content-readiness poll ahead of row cloning.
    ReadinessPoll,
}

/// Cancellation handle for a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimerToken(u64);

/// Injectable scheduling primitives.
pub trait Scheduler {
    fn now(&self) -> Duration;

    /// Request one animation frame (`requestAnimationFrame`).
    fn schedule_frame(&mut self, task: Task) -> TimerToken;

    /// One-shot timeout (`setTimeout`).
    fn schedule_after(&mut self, delay: Duration, task: Task) -> TimerToken;

    /// Fixed-period timer (`setInterval`).
    fn schedule_every(&mut self, period: Duration, task: Task) -> TimerToken;

    /// Cancel a pending task. Unknown or already-fired tokens are ignored.
    fn cancel(&mut self, token: TimerToken);

    /// Next task whose deadline has passed, earliest first.
    fn pop_due(&mut self) -> Option<Task>;

    /// Deadline of the earliest runnable task.
    fn next_deadline(&self) -> Option<Duration>;

    fn is_pending(&self, token: TimerToken) -> bool;
}

#[derive(Debug, Clone)]
struct Entry {
    deadline: Duration,
    seq: u64,
    token: TimerToken,
    task: Task,
    period: Option<Duration>,
    frame: bool,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest deadline first (max-heap, so reversed), then FIFO.
        other.deadline.cmp(&self.deadline).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Deadline-ordered queue implementing [`Scheduler`] over any [`Clock`].
#[derive(Debug)]
pub struct TimerQueue<C: Clock> {
    clock: C,
    frame_interval: Duration,
    heap: BinaryHeap<Entry>,
    live: HashSet<TimerToken>,
    held_frames: Vec<Entry>,
    frames_throttled: bool,
    next_seq: u64,
}

impl<C: Clock> TimerQueue<C> {
    pub fn new(clock: C, frame_interval: Duration) -> Self {
        Self {
            clock,
            frame_interval: frame_interval.max(Duration::from_millis(1)),
            heap: BinaryHeap::new(),
            live: HashSet::new(),
            held_frames: Vec::new(),
            frames_throttled: false,
            next_seq: 0,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Simulate a browser that stops delivering animation frames (background
    /// or low-priority tab). Timers keep firing. Held frames are re-armed when
    /// throttling ends.
    pub fn set_frames_throttled(&mut self, throttled: bool) {
        self.frames_throttled = throttled;
        if throttled {
            return;
        }
        let now = self.clock.now();
        for mut entry in std::mem::take(&mut self.held_frames) {
            if self.live.contains(&entry.token) {
                entry.deadline = now + self.frame_interval;
                self.heap.push(entry);
            }
        }
    }

    #[must_use]
    pub fn frames_throttled(&self) -> bool {
        self.frames_throttled
    }

    /// Number of live pending tasks.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.live.len()
    }

    fn push(&mut self, delay: Duration, task: Task, period: Option<Duration>, frame: bool) -> TimerToken {
        self.next_seq += 1;
        let token = TimerToken(self.next_seq);
        self.live.insert(token);
        self.heap.push(Entry {
            deadline: self.clock.now() + delay,
            seq: self.next_seq,
            token,
            task,
            period,
            frame,
        });
        token
    }
}

impl<C: Clock> Scheduler for TimerQueue<C> {
    fn now(&self) -> Duration {
        self.clock.now()
    }

    fn schedule_frame(&mut self, task: Task) -> TimerToken {
        self.push(self.frame_interval, task, None, true)
    }

    fn schedule_after(&mut self, delay: Duration, task: Task) -> TimerToken {
        self.push(delay, task, None, false)
    }

    fn schedule_every(&mut self, period: Duration, task: Task) -> TimerToken {
        let period = period.max(Duration::from_millis(1));
        self.push(period, task, Some(period), false)
    }

    fn cancel(&mut self, token: TimerToken) {
        self.live.remove(&token);
    }

    fn pop_due(&mut self) -> Option<Task> {
        let now = self.clock.now();
        loop {
            let top = self.heap.peek()?;
            if !self.live.contains(&top.token) {
                self.heap.pop();
                continue;
            }
            if top.deadline > now {
                return None;
            }
            let mut entry = self.heap.pop()?;
            if entry.frame && self.frames_throttled {
                self.held_frames.push(entry);
                continue;
            }
            let task = entry.task;
            match entry.period {
                Some(period) => {
                    // Coalesce missed ticks instead of replaying a burst.
                    let next = entry.deadline + period;
                    entry.deadline = if next <= now { now + period } else { next };
                    self.next_seq += 1;
                    entry.seq = self.next_seq;
                    self.heap.push(entry);
                }
                None => {
                    self.live.remove(&entry.token);
                }
            }
            return Some(task);
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.heap
            .iter()
            .filter(|e| self.live.contains(&e.token) && !(e.frame && self.frames_throttled))
            .map(|e| e.deadline)
            .min()
    }

    fn is_pending(&self, token: TimerToken) -> bool {
        self.live.contains(&token)
    }
}
