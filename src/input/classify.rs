//! End-of-gesture motion discrimination for swipes and pinches.

use crate::config::gestures::Motion;

/// Minor/major component ratio above which a swipe counts as oblique, tan(22.5°).
pub const OBLIQUE_RATIO: f64 = 0.414_213_562_373_095_1;

/// Rotation in degrees a pinch must exceed to count as a rotation.
pub const ROTATION_THRESHOLD: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeLimits {
    /// Minimum travelled distance in dots.
    pub min_distance: f64,
    /// Maximum gesture duration in ms, 0 disables.
    pub timeout_ms: u64,
}

impl Default for SwipeLimits {
    fn default() -> Self {
        Self {
            min_distance: 0.0,
            timeout_ms: 0,
        }
    }
}

/// Classify a finished swipe from its summed `(dx, dy)`.
///
/// Negative `dy` points up, as in screen coordinates.
pub fn classify_swipe(
    [dx, dy]: [f64; 2],
    elapsed_ms: u64,
    limits: &SwipeLimits,
    extended: bool,
) -> Option<Motion> {
    if limits.timeout_ms > 0 && elapsed_ms >= limits.timeout_ms {
        return None;
    }
    if dx * dx + dy * dy < limits.min_distance * limits.min_distance {
        return None;
    }

    let horizontal = if dx < 0.0 { Motion::Left } else { Motion::Right };
    let vertical = if dy < 0.0 { Motion::Up } else { Motion::Down };
    let (abs_x, abs_y) = (dx.abs(), dy.abs());

    if abs_x > abs_y {
        if extended && abs_y / abs_x > OBLIQUE_RATIO {
            return Motion::oblique(horizontal, vertical);
        }
        Some(horizontal)
    } else {
        if extended && abs_y > 0.0 && abs_x / abs_y > OBLIQUE_RATIO {
            return Motion::oblique(horizontal, vertical);
        }
        Some(vertical)
    }
}

/// Classify a finished pinch from its summed `(scale - 1, rotation)`.
///
/// An exactly zero ratio yields nothing.
pub fn classify_pinch([ratio, angle]: [f64; 2], extended: bool) -> Option<Motion> {
    if extended && angle.abs() > ROTATION_THRESHOLD {
        return Some(if angle >= 0.0 {
            Motion::Clockwise
        } else {
            Motion::Anticlockwise
        });
    }
    if ratio != 0.0 {
        return Some(if ratio <= 0.0 { Motion::In } else { Motion::Out });
    }
    None
}
