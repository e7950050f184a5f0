//! `_internal` workspace switching through `wmctrl`.

use std::process::Output;

use anyhow::{bail, Context, Result};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// First command token selecting the internal handler.
pub const INTERNAL_COMMAND: &str = "_internal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceMove {
    Up,
    Down,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InternalError {
    #[error("expected ws_up or ws_down")]
    MissingDirection,
    #[error("{0} requires a column count")]
    MissingColumns(String),
    #[error("invalid column count '{0}'")]
    InvalidColumns(String),
    #[error("unknown argument '{0}'")]
    UnknownArgument(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalCommand {
    pub direction: WorkspaceMove,
    /// Workspaces skipped per move, i.e. the column count of a grid layout.
    pub step: usize,
    pub wrap: bool,
}

impl InternalCommand {
    /// Parse the arguments following `_internal`.
    pub fn parse(args: &[String]) -> Result<Self, InternalError> {
        let mut direction = None;
        let mut step = 1;
        let mut wrap = false;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "ws_up" => direction = Some(WorkspaceMove::Up),
                "ws_down" => direction = Some(WorkspaceMove::Down),
                "-w" | "--wrap" => wrap = true,
                "-c" | "--col" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| InternalError::MissingColumns(arg.clone()))?;
                    step = value
                        .parse::<usize>()
                        .ok()
                        .filter(|cols| *cols > 0)
                        .ok_or_else(|| InternalError::InvalidColumns(value.clone()))?;
                }
                other => return Err(InternalError::UnknownArgument(other.to_string())),
            }
        }

        let direction = direction.ok_or(InternalError::MissingDirection)?;
        Ok(Self {
            direction,
            step,
            wrap,
        })
    }

    /// Workspace index to switch to, or `None` to stay put.
    pub fn target(&self, current: usize, count: usize) -> Option<usize> {
        if count == 0 || current >= count {
            return None;
        }
        let (current, count, step) = (current as i64, count as i64, self.step as i64);
        let target = match self.direction {
            WorkspaceMove::Up => current - step,
            WorkspaceMove::Down => current + step,
        };

        let target = if self.wrap {
            target.rem_euclid(count)
        } else if (0..count).contains(&target) {
            target
        } else {
            return None;
        };

        (target != current).then_some(target as usize)
    }

    pub async fn run(&self) -> Result<()> {
        let output = wmctrl(&["-d"]).await?;
        let listing = String::from_utf8_lossy(&output.stdout);
        let (current, count) = parse_desktops(&listing).context("no current desktop in wmctrl -d")?;

        match self.target(current, count) {
            Some(target) => {
                info!(from = current, to = target, "switching workspace");
                wmctrl(&["-s", &target.to_string()]).await?;
            }
            None => debug!(current, count, "workspace switch out of range, ignoring"),
        }
        Ok(())
    }
}

async fn wmctrl(args: &[&str]) -> Result<Output> {
    let output = Command::new("wmctrl")
        .args(args)
        .output()
        .await
        .context("failed to run wmctrl")?;
    if !output.status.success() {
        bail!(
            "wmctrl {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(output)
}

/// Current desktop index and desktop count from `wmctrl -d` output.
pub fn parse_desktops(listing: &str) -> Option<(usize, usize)> {
    let mut current = None;
    let mut count = 0;
    for line in listing.lines().filter(|line| !line.trim().is_empty()) {
        let mut fields = line.split_whitespace();
        let index = fields.next().and_then(|field| field.parse::<usize>().ok());
        if fields.next() == Some("*") {
            current = index;
        }
        count += 1;
    }
    current.map(|current| (current, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_direction_and_options() {
        let cmd = InternalCommand::parse(&args(&["ws_down", "--col", "3", "--wrap"])).unwrap();
        assert_eq!(cmd.direction, WorkspaceMove::Down);
        assert_eq!(cmd.step, 3);
        assert!(cmd.wrap);

        assert_eq!(
            InternalCommand::parse(&args(&["--wrap"])),
            Err(InternalError::MissingDirection)
        );
        assert_eq!(
            InternalCommand::parse(&args(&["ws_up", "--col"])),
            Err(InternalError::MissingColumns("--col".into()))
        );
        assert_eq!(
            InternalCommand::parse(&args(&["ws_up", "--col", "0"])),
            Err(InternalError::InvalidColumns("0".into()))
        );
        assert_eq!(
            InternalCommand::parse(&args(&["ws_left"])),
            Err(InternalError::UnknownArgument("ws_left".into()))
        );
    }

    #[test]
    fn target_clamps_without_wrap() {
        let up = InternalCommand::parse(&args(&["ws_up"])).unwrap();
        assert_eq!(up.target(2, 4), Some(1));
        assert_eq!(up.target(0, 4), None);

        let down = InternalCommand::parse(&args(&["ws_down", "--col", "2"])).unwrap();
        assert_eq!(down.target(1, 4), Some(3));
        assert_eq!(down.target(2, 4), None);
    }

    #[test]
    fn target_wraps_around() {
        let up = InternalCommand::parse(&args(&["ws_up", "-w"])).unwrap();
        assert_eq!(up.target(0, 4), Some(3));

        let down = InternalCommand::parse(&args(&["ws_down", "--wrap"])).unwrap();
        assert_eq!(down.target(3, 4), Some(0));
        assert_eq!(down.target(0, 1), None);
    }

    #[test]
    fn reads_wmctrl_listing() {
        let listing = "\
0  - DG: 1920x1080  VP: N/A  WA: 0,0 1920x1080  Workspace 1
1  * DG: 1920x1080  VP: 0,0  WA: 0,0 1920x1080  Workspace 2
2  - DG: 1920x1080  VP: N/A  WA: 0,0 1920x1080  Workspace 3
";
        assert_eq!(parse_desktops(listing), Some((1, 3)));
        assert_eq!(parse_desktops(""), None);
    }
}
