//! Line-oriented configuration format.
//!
//! ```text
//! # comment
//! device all
//! swipe_threshold 50
//! timeout 250
//! drag_delay 80
//! drag_delay_3 on
//! gesture swipe left 3 xdotool key super+Right
//! gesture pinch in xdotool key ctrl+minus
//! ```

use thiserror::Error;

use super::gestures::{parse_binding, BindingError, GestureFamily};
use super::Config;

#[derive(Debug, Error, PartialEq)]
pub enum LineError {
    #[error("unknown keyword '{0}'")]
    UnknownKeyword(String),
    #[error("'{0}' needs a value")]
    MissingValue(String),
    #[error("invalid value '{value}' for '{keyword}'")]
    InvalidValue { keyword: String, value: String },
    #[error("unknown gesture type '{0}'")]
    UnknownGesture(String),
    #[error(transparent)]
    Binding(#[from] BindingError),
}

/// Parse the whole file; errors carry the 1-based line number.
pub fn parse(content: &str) -> Result<Config, (usize, LineError)> {
    let mut config = Config::default();
    for (index, line) in content.lines().enumerate() {
        parse_line(&mut config, line).map_err(|err| (index + 1, err))?;
    }
    Ok(config)
}

fn parse_line(config: &mut Config, line: &str) -> Result<(), LineError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(());
    }

    let (keyword, value) = match line.split_once(char::is_whitespace) {
        Some((keyword, value)) => (keyword, value.trim()),
        None => (line, ""),
    };
    let keyword = keyword.to_ascii_lowercase();
    if value.is_empty() {
        return Err(LineError::MissingValue(keyword));
    }

    let invalid = || LineError::InvalidValue {
        keyword: keyword.clone(),
        value: value.to_string(),
    };

    match keyword.as_str() {
        "gesture" => {
            let (family_name, binding) = value
                .split_once(char::is_whitespace)
                .unwrap_or((value, ""));
            let family = GestureFamily::from_name(family_name)
                .ok_or_else(|| LineError::UnknownGesture(family_name.to_string()))?;
            // Validate here so the error points at this line.
            parse_binding(family, binding)?;
            config
                .gestures
                .entry(family.name().to_string())
                .or_default()
                .push(binding.trim().to_string());
        }
        "device" => config.device = Some(value.to_string()),
        "swipe_threshold" => config.swipe_threshold = value.parse().map_err(|_| invalid())?,
        "timeout" => config.timeout = value.parse().map_err(|_| invalid())?,
        "drag_delay" => config.drag_delay = value.parse().map_err(|_| invalid())?,
        "drag_delay_3" => config.drag_delay_3 = parse_flag(value).ok_or_else(invalid)?,
        "drag_delay_4" => config.drag_delay_4 = parse_flag(value).ok_or_else(invalid)?,
        _ => return Err(LineError::UnknownKeyword(keyword.clone())),
    }
    Ok(())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "0" | "off" | "false" | "no" => Some(false),
        _ => None,
    }
}
