//! Parsing of `libinput debug-events` gesture lines.

use thiserror::Error;

pub use crate::config::gestures::DeviceGesture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Begin,
    Update,
    End,
}

/// One gesture line from the event source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub kind: EventKind,
    pub gesture: DeviceGesture,
    pub fingers: u8,
    /// Numeric fields as printed, punctuation and labels removed.
    pub payload: Vec<String>,
    /// Only ever set on `End`.
    pub cancelled: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum EventError {
    #[error("unknown gesture family '{0}'")]
    UnknownGestureFamily(String),
    #[error("unknown gesture event kind '{0}'")]
    UnknownEventKind(String),
    #[error("malformed gesture line '{0}'")]
    Malformed(String),
}

const GESTURE_PREFIX: &str = "GESTURE_";

/// Parse one line of event output.
///
/// Returns `Ok(None)` for lines that are not gesture events at all (device
/// announcements, pointer motion, ...). Lines look like
/// `event7  GESTURE_SWIPE_UPDATE  +2.041s  3  4.37/ 0.36 ( 8.72/ 0.73 unaccelerated)`.
pub fn parse_line(line: &str) -> Result<Option<RawEvent>, EventError> {
    let line = line.trim();
    if !line.contains(GESTURE_PREFIX) {
        return Ok(None);
    }

    let mut fields = line.split_whitespace();
    let malformed = || EventError::Malformed(line.to_string());

    let _device = fields.next().ok_or_else(malformed)?;
    let event_name = fields.next().ok_or_else(malformed)?;
    let Some(event_name) = event_name.strip_prefix(GESTURE_PREFIX) else {
        return Ok(None);
    };
    let (family, kind) = event_name.split_once('_').ok_or_else(malformed)?;

    let gesture = match family {
        "SWIPE" => DeviceGesture::Swipe,
        "PINCH" => DeviceGesture::Pinch,
        other => return Err(EventError::UnknownGestureFamily(other.to_string())),
    };
    let kind = match kind {
        "BEGIN" => EventKind::Begin,
        "UPDATE" => EventKind::Update,
        "END" => EventKind::End,
        other => return Err(EventError::UnknownEventKind(other.to_string())),
    };

    let _time = fields.next().ok_or_else(malformed)?;
    let fingers = fields
        .next()
        .and_then(|value| value.parse::<u8>().ok())
        .ok_or_else(malformed)?;

    let rest: Vec<&str> = fields.collect();
    let cancelled = kind == EventKind::End && rest.first() == Some(&"cancelled");
    let payload = if kind == EventKind::Update {
        split_payload(&rest.join(" "))
    } else {
        Vec::new()
    };

    Ok(Some(RawEvent {
        kind,
        gesture,
        fingers,
        payload,
        cancelled,
    }))
}

fn split_payload(text: &str) -> Vec<String> {
    text.replace(['/', '(', ')'], " ")
        .split_whitespace()
        .filter(|field| !matches!(*field, "unaccelerated" | "@"))
        .map(str::to_string)
        .collect()
}
