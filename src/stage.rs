//! Hosting for mounted effects.
//!
//! A [`Stage`] owns every mounted effect together with its single tick timer and, for effects
//! that activate on visibility, its observer registration. Time only moves when the host calls
//! [`Stage::advance`], so the same code drives a terminal UI from a wall clock and a test from
//! a hand-cranked one.
//!
//! Every path that ends a run leaves the instance with no armed timer, and unmounting also drops
//! the observer, so nothing can fire against an instance after it's gone.

use crate::config::{ConfigError, ScrambleConfig};
use crate::scramble::{ActivationMode, Frame, TextScrambleEffect};
use std::time::Duration;
use tracing::{debug, trace};

/// Identifies a mounted effect.
///
/// Handles of unmounted effects are rejected by every operation, even if their slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectHandle {
    index: usize,
    generation: u32,
}

/// The one timer an effect instance may have
#[derive(Debug)]
struct TickTimer {
    interval: Duration,
    due: Option<Duration>,
}

impl TickTimer {
    fn new(interval: Duration) -> Self {
        Self { interval, due: None }
    }

    fn arm(&mut self, now: Duration) {
        self.due = Some(now + self.interval);
    }

    fn cancel(&mut self) {
        self.due = None;
    }
}

#[derive(Debug)]
struct Mounted {
    effect: TextScrambleEffect,
    timer: TickTimer,
    /// Whether a visibility observer is registered for this instance
    observing: bool,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    mounted: Option<Mounted>,
}

/// An arena of mounted effects sharing one clock.
#[derive(Debug)]
pub struct Stage {
    slots: Vec<Slot>,
    free: Vec<usize>,
    now: Duration,
    seeder: fastrand::Rng,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    /// Create a stage whose effects scramble deterministically
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed))
    }

    fn with_rng(seeder: fastrand::Rng) -> Self {
        Self { slots: Vec::new(), free: Vec::new(), now: Duration::ZERO, seeder }
    }

    /// Mount an effect showing `text`.
    pub fn mount(&mut self, text: &str, config: ScrambleConfig) -> Result<EffectHandle, ConfigError> {
        let observing = config.activation == ActivationMode::OnceVisible;
        let timer = TickTimer::new(config.tick_interval);
        let effect = TextScrambleEffect::mount_with_rng(text, config, self.seeder.fork())?;
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.mounted = Some(Mounted { effect, timer, observing });
        debug!(index, text, "mounted effect");
        Ok(EffectHandle { index, generation: slot.generation })
    }

    /// Tear an effect down, cancelling its timer and observer. Returns `false` for stale handles.
    pub fn unmount(&mut self, handle: EffectHandle) -> bool {
        if self.mounted(handle).is_none() {
            return false;
        }
        let slot = &mut self.slots[handle.index];
        slot.mounted = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        debug!(index = handle.index, "unmounted effect");
        true
    }

    /// The pointer entered a hover effect. Returns `true` if a run started.
    pub fn pointer_enter(&mut self, handle: EffectHandle) -> bool {
        let now = self.now;
        let Some(mounted) = self.mounted_mut(handle) else {
            return false;
        };
        if mounted.effect.config().activation != ActivationMode::Hover {
            return false;
        }
        Self::start(mounted, now)
    }

    /// The pointer left a hover effect. Cancels any run in progress.
    pub fn pointer_leave(&mut self, handle: EffectHandle) {
        let Some(mounted) = self.mounted_mut(handle) else {
            return;
        };
        if mounted.effect.config().activation != ActivationMode::Hover {
            return;
        }
        mounted.timer.cancel();
        mounted.effect.deactivate();
    }

    /// The host measured how much of an effect is on screen. Returns `true` if a run started.
    ///
    /// The first notification that counts as visible consumes the observer; anything after that
    /// is ignored.
    pub fn visibility_changed(&mut self, handle: EffectHandle, visible_fraction: f32) -> bool {
        let now = self.now;
        let Some(mounted) = self.mounted_mut(handle) else {
            return false;
        };
        if !mounted.observing || !mounted.effect.config().is_visible(visible_fraction) {
            return false;
        }
        mounted.observing = false;
        Self::start(mounted, now)
    }

    fn start(mounted: &mut Mounted, now: Duration) -> bool {
        if !mounted.effect.activate() {
            return false;
        }
        mounted.timer.arm(now);
        true
    }

    /// Move the clock forward by `elapsed`, firing every tick that falls due on the way in due
    /// order. Returns the effects whose frame changed.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<EffectHandle> {
        let deadline = self.now + elapsed;
        let mut changed = Vec::new();
        while let Some((due, index)) = self.earliest_due().filter(|(due, _)| *due <= deadline) {
            self.now = due;
            let slot = &mut self.slots[index];
            let Some(mounted) = slot.mounted.as_mut() else {
                continue;
            };
            mounted.effect.tick();
            if mounted.effect.is_running() {
                mounted.timer.arm(due);
            } else {
                mounted.timer.cancel();
            }
            trace!(index, at = ?due, "tick");
            let handle = EffectHandle { index, generation: slot.generation };
            if !changed.contains(&handle) {
                changed.push(handle);
            }
        }
        self.now = deadline;
        changed
    }

    fn earliest_due(&self) -> Option<(Duration, usize)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| Some((slot.mounted.as_ref()?.timer.due?, index)))
            .min()
    }

    /// When the next tick falls due, if any timer is armed
    pub fn next_due(&self) -> Option<Duration> {
        self.earliest_due().map(|(due, _)| due)
    }

    /// The stage clock
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn frame(&self, handle: EffectHandle) -> Option<Frame> {
        self.mounted(handle).map(|m| m.effect.frame())
    }

    pub fn effect(&self, handle: EffectHandle) -> Option<&TextScrambleEffect> {
        self.mounted(handle).map(|m| &m.effect)
    }

    /// Handles of every mounted effect
    pub fn handles(&self) -> impl Iterator<Item = EffectHandle> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.mounted.is_some())
            .map(|(index, slot)| EffectHandle { index, generation: slot.generation })
    }

    /// Number of armed tick timers
    pub fn live_timers(&self) -> usize {
        self.slots.iter().filter_map(|s| s.mounted.as_ref()).filter(|m| m.timer.due.is_some()).count()
    }

    /// Number of registered visibility observers
    pub fn live_observers(&self) -> usize {
        self.slots.iter().filter_map(|s| s.mounted.as_ref()).filter(|m| m.observing).count()
    }

    fn mounted(&self, handle: EffectHandle) -> Option<&Mounted> {
        let slot = self.slots.get(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.mounted.as_ref()
    }

    fn mounted_mut(&mut self, handle: EffectHandle) -> Option<&mut Mounted> {
        let slot = self.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.mounted.as_mut()
    }
}
