use thiserror::Error;
use tracing::{debug, trace, warn};

use super::{
    actions::Action,
    classify::{classify_pinch, classify_swipe, SwipeLimits},
    delay::{DelayArbiter, DelaySettings, EndVerdict, UpdateVerdict},
    events::{EventKind, RawEvent},
};
use crate::config::gestures::{
    ActionTable, DeviceGesture, FamilyBehavior, GestureFamily, HookPhase, Motion,
};

/// Validated numeric settings the engine runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineSettings {
    pub swipe: SwipeLimits,
    pub delay: DelaySettings,
}

/// The single in-flight gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSession {
    pub family: GestureFamily,
    pub fingers: u8,
    pub start_ms: u64,
    /// Swipe: summed (dx, dy). Pinch: summed (scale - 1, degrees).
    /// Hooks: the latest update's leading pair.
    pub accumulator: [f64; 2],
}

#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("gesture update carries {found} fields, {expected} needed")]
    MissingField { expected: usize, found: usize },
    #[error("gesture update field '{0}' is not a number")]
    MalformedPayload(String),
}

pub struct GestureEngine {
    table: ActionTable,
    limits: SwipeLimits,
    arbiter: DelayArbiter,
    session: Option<GestureSession>,
}

impl GestureEngine {
    pub fn new(table: ActionTable, settings: EngineSettings) -> Self {
        Self {
            table,
            limits: settings.swipe,
            arbiter: DelayArbiter::new(settings.delay),
            session: None,
        }
    }

    pub fn table(&self) -> &ActionTable {
        &self.table
    }

    pub fn arbiter(&self) -> &DelayArbiter {
        &self.arbiter
    }

    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    /// Route one parsed event; returns the action to run, if any.
    #[profiling::function]
    pub fn dispatch(&mut self, event: &RawEvent, now_ms: u64) -> Option<Action> {
        match event.kind {
            EventKind::Begin => {
                let family = self.session_family(event.gesture, event.fingers);
                self.begin(family, event.fingers, now_ms)
            }
            EventKind::Update => {
                if !self.session_matches(event.gesture) {
                    return None;
                }
                match self.update(&event.payload, now_ms) {
                    Ok(action) => action,
                    Err(err) => {
                        warn!(gesture = ?event.gesture, error = %err, "dropping gesture update");
                        None
                    }
                }
            }
            EventKind::End => {
                if !self.session_matches(event.gesture) {
                    return None;
                }
                self.end(event.cancelled, now_ms)
            }
        }
    }

    /// Hooks take over a gesture whenever one of them is bound for its finger count.
    fn session_family(&self, gesture: DeviceGesture, fingers: u8) -> GestureFamily {
        let hooked = HookPhase::ALL
            .iter()
            .any(|phase| self.table.binds_fingers(gesture.hook(*phase), fingers));
        if hooked {
            gesture.hook(HookPhase::Begin)
        } else {
            gesture.classified()
        }
    }

    fn session_matches(&self, gesture: DeviceGesture) -> bool {
        match &self.session {
            Some(session) if session.family.device_gesture() == gesture => true,
            Some(session) => {
                trace!(active = %session.family, ?gesture, "event for another gesture, ignoring");
                false
            }
            None => false,
        }
    }

    /// Start a new session, replacing any active one.
    pub fn begin(&mut self, family: GestureFamily, fingers: u8, now_ms: u64) -> Option<Action> {
        if let Some(stale) = &self.session {
            debug!(family = %stale.family, "gesture begin replaces unfinished session");
        }
        self.arbiter.clear();
        self.session = Some(GestureSession {
            family,
            fingers,
            start_ms: now_ms,
            accumulator: [0.0, 0.0],
        });

        match family.behavior() {
            FamilyBehavior::ClassifyAtEnd(_) => None,
            FamilyBehavior::FireEveryEvent(gesture, _) => {
                let action = self.resolve(
                    gesture.hook(HookPhase::Begin),
                    Motion::All,
                    fingers,
                    [0.0, 0.0],
                );
                if self.arbiter.applies(fingers) {
                    self.arbiter.defer_begin(gesture, action);
                    None
                } else {
                    action
                }
            }
        }
    }

    /// Feed one update's payload into the active session.
    ///
    /// A malformed payload leaves the session untouched.
    pub fn update(&mut self, payload: &[String], now_ms: u64) -> Result<Option<Action>, PayloadError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };

        match session.family.behavior() {
            FamilyBehavior::ClassifyAtEnd(DeviceGesture::Swipe) => {
                let [dx, dy] = swipe_deltas(payload)?;
                session.accumulator[0] += dx;
                session.accumulator[1] += dy;
                Ok(None)
            }
            FamilyBehavior::ClassifyAtEnd(DeviceGesture::Pinch) => {
                let [scale, angle] = pinch_fields(payload)?;
                session.accumulator[0] += scale - 1.0;
                session.accumulator[1] += angle;
                Ok(None)
            }
            FamilyBehavior::FireEveryEvent(gesture, _) => {
                let coords = numeric_fields(payload, 0)?;
                let fingers = session.fingers;
                let elapsed = now_ms.saturating_sub(session.start_ms);

                if self.arbiter.applies(fingers) {
                    match self.arbiter.on_update(gesture, elapsed) {
                        UpdateVerdict::PassThrough => {}
                        UpdateVerdict::Hold => return Ok(None),
                        UpdateVerdict::Release(begin) => {
                            session.accumulator = coords;
                            return Ok(begin);
                        }
                    }
                }
                session.accumulator = coords;
                Ok(self.resolve(gesture.hook(HookPhase::Update), Motion::All, fingers, coords))
            }
        }
    }

    /// Finish the active session. The session is gone afterwards whatever the outcome.
    pub fn end(&mut self, cancelled: bool, now_ms: u64) -> Option<Action> {
        let session = self.session.take()?;
        let GestureSession {
            family,
            fingers,
            start_ms,
            accumulator,
        } = session;

        if cancelled {
            self.arbiter.clear();
            debug!(family = %family, fingers, "gesture cancelled");
            return None;
        }

        match family.behavior() {
            FamilyBehavior::ClassifyAtEnd(gesture) => {
                let family = gesture.classified();
                let extended = self.table.has_extended(family);
                let motion = match gesture {
                    DeviceGesture::Swipe => classify_swipe(
                        accumulator,
                        now_ms.saturating_sub(start_ms),
                        &self.limits,
                        extended,
                    ),
                    DeviceGesture::Pinch => classify_pinch(accumulator, extended),
                };
                let Some(motion) = motion else {
                    debug!(family = %family, fingers, ?accumulator, "gesture below thresholds");
                    return None;
                };
                debug!(family = %family, %motion, fingers, ?accumulator, "gesture classified");
                self.resolve(family, motion, fingers, accumulator)
            }
            FamilyBehavior::FireEveryEvent(gesture, _) => {
                if self.arbiter.applies(fingers) && self.arbiter.on_end(gesture) == EndVerdict::Discard
                {
                    debug!(family = %family, fingers, "gesture ended before settling, dropped");
                    return None;
                }
                self.arbiter.clear();
                self.resolve(gesture.hook(HookPhase::End), Motion::All, fingers, accumulator)
            }
        }
    }

    fn resolve(
        &self,
        family: GestureFamily,
        motion: Motion,
        fingers: u8,
        coords: [f64; 2],
    ) -> Option<Action> {
        let Some(command) = self.table.resolve(family, motion, fingers) else {
            trace!(family = %family, %motion, fingers, "no command bound");
            return None;
        };
        Some(Action {
            family,
            motion,
            fingers,
            command: command.clone(),
            coords,
        })
    }
}

fn parse_field(field: &str) -> Result<f64, PayloadError> {
    field
        .parse::<f64>()
        .map_err(|_| PayloadError::MalformedPayload(field.to_string()))
}

fn numeric_fields(payload: &[String], start: usize) -> Result<[f64; 2], PayloadError> {
    match payload.get(start..start + 2) {
        Some([first, second]) => Ok([parse_field(first)?, parse_field(second)?]),
        _ => Err(PayloadError::MissingField {
            expected: start + 2,
            found: payload.len(),
        }),
    }
}

/// Unaccelerated deltas when the line carries them, else the accelerated ones.
fn swipe_deltas(payload: &[String]) -> Result<[f64; 2], PayloadError> {
    if payload.len() >= 4 {
        numeric_fields(payload, 2)
    } else {
        numeric_fields(payload, 0)
    }
}

/// Scale and rotation, the last two fields of a pinch update.
fn pinch_fields(payload: &[String]) -> Result<[f64; 2], PayloadError> {
    if payload.len() < 4 {
        return Err(PayloadError::MissingField {
            expected: 4,
            found: payload.len(),
        });
    }
    numeric_fields(payload, payload.len() - 2)
}
