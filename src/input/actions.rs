use std::process::Stdio;

use tokio::process::Command;
use tracing::{error, info};

use crate::config::gestures::{CommandHandler, CommandTemplate, GestureFamily, Motion};

/// A resolved gesture ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub family: GestureFamily,
    pub motion: Motion,
    pub fingers: u8,
    pub command: CommandTemplate,
    pub coords: [f64; 2],
}

impl Action {
    /// Command line with placeholders substituted.
    pub fn argv(&self) -> Vec<String> {
        self.command.render(self.coords)
    }
}

/// Receives actions as the engine produces them.
pub trait ActionSink {
    fn execute(&mut self, action: &Action);
}

/// Runs actions without waiting for them to finish.
#[derive(Debug, Default)]
pub struct Launcher;

impl Launcher {
    pub fn launch_program(&self, cmd: &str, args: &[String]) {
        info!(program = %cmd, args = ?args, "Starting program");

        if let Err(e) = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(false)
            .spawn()
        {
            error!(program = %cmd, err = %e, "Failed to start program");
        }
    }
}

impl ActionSink for Launcher {
    fn execute(&mut self, action: &Action) {
        match action.command.handler() {
            CommandHandler::Internal(internal) => {
                let internal = internal.clone();
                tokio::spawn(async move {
                    if let Err(err) = internal.run().await {
                        error!(error = %err, "internal command failed");
                    }
                });
            }
            CommandHandler::External => {
                let argv = action.argv();
                if let Some((cmd, args)) = argv.split_first() {
                    self.launch_program(cmd, args);
                }
            }
        }
    }
}

/// Logs actions instead of running them.
#[derive(Debug, Default)]
pub struct DryRun;

impl ActionSink for DryRun {
    fn execute(&mut self, action: &Action) {
        info!(
            gesture = %action.family,
            motion = %action.motion,
            fingers = action.fingers,
            command = %shell_words::join(action.argv()),
            "would run"
        );
    }
}

/// Collects actions in memory.
impl ActionSink for Vec<Action> {
    fn execute(&mut self, action: &Action) {
        self.push(action.clone());
    }
}
