//! Settle-time arbitration for 3 and 4 finger generic drag hooks.
//!
//! With arbitration enabled a begin hook is held back. It fires, once, on the
//! first update arriving after the configured delay; a gesture that ends before
//! that fires nothing at all. Later updates and the end hook pass through.

use tracing::trace;

use super::actions::Action;
use crate::config::gestures::DeviceGesture;

pub const DEFAULT_DELAY_MS: u64 = 60;
pub const MIN_DELAY_MS: u64 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelaySettings {
    pub threshold_ms: u64,
    pub three_fingers: bool,
    pub four_fingers: bool,
}

impl Default for DelaySettings {
    fn default() -> Self {
        Self {
            threshold_ms: DEFAULT_DELAY_MS,
            three_fingers: false,
            four_fingers: false,
        }
    }
}

impl DelaySettings {
    pub fn enabled_for(&self, fingers: u8) -> bool {
        match fingers {
            3 => self.three_fingers,
            4 => self.four_fingers,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DelayPending {
    /// Begin action with the coordinates it had at begin time.
    pub action: Option<Action>,
    pub fired: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateVerdict {
    /// No arbitration in effect, run the update hook.
    PassThrough,
    /// Delay elapsed: emit the held begin action instead of this update.
    Release(Option<Action>),
    /// Still settling, drop the update.
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndVerdict {
    PassThrough,
    /// Begin never fired, the whole gesture is dropped.
    Discard,
}

#[derive(Debug, Default)]
pub struct DelayArbiter {
    settings: DelaySettings,
    pending: [Option<DelayPending>; 2],
}

impl DelayArbiter {
    pub fn new(settings: DelaySettings) -> Self {
        Self {
            settings,
            pending: [None, None],
        }
    }

    pub fn settings(&self) -> &DelaySettings {
        &self.settings
    }

    pub fn applies(&self, fingers: u8) -> bool {
        self.settings.enabled_for(fingers)
    }

    pub fn pending(&self, gesture: DeviceGesture) -> Option<&DelayPending> {
        self.pending[gesture.slot()].as_ref()
    }

    pub fn clear(&mut self) {
        self.pending = [None, None];
    }

    pub fn defer_begin(&mut self, gesture: DeviceGesture, action: Option<Action>) {
        trace!(?gesture, "holding begin hook");
        self.pending[gesture.slot()] = Some(DelayPending {
            action,
            fired: false,
        });
    }

    pub fn on_update(&mut self, gesture: DeviceGesture, elapsed_ms: u64) -> UpdateVerdict {
        let Some(pending) = self.pending[gesture.slot()].as_mut() else {
            return UpdateVerdict::PassThrough;
        };
        if pending.fired {
            return UpdateVerdict::PassThrough;
        }
        if elapsed_ms > self.settings.threshold_ms {
            pending.fired = true;
            trace!(?gesture, elapsed_ms, "releasing held begin hook");
            return UpdateVerdict::Release(pending.action.clone());
        }
        UpdateVerdict::Hold
    }

    pub fn on_end(&mut self, gesture: DeviceGesture) -> EndVerdict {
        match self.pending[gesture.slot()].take() {
            Some(DelayPending { fired: false, .. }) => EndVerdict::Discard,
            _ => EndVerdict::PassThrough,
        }
    }
}
