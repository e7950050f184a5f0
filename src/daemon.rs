//! Event loop feeding gesture lines into the engine.

use std::process::Stdio;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::signal;
use tracing::{debug, info, warn};

use crate::cli::Options;
use crate::config::Config;
use crate::device::{self, DeviceSelection};
use crate::input::{parse_line, ActionSink, DryRun, GestureEngine, Launcher};

/// Parse and dispatch one line, handing any resulting action to `sink`.
pub fn handle_line(line: &str, engine: &mut GestureEngine, sink: &mut dyn ActionSink, now_ms: u64) {
    match parse_line(line) {
        Ok(Some(event)) => {
            if let Some(action) = engine.dispatch(&event, now_ms) {
                sink.execute(&action);
            }
        }
        Ok(None) => {}
        Err(err) => debug!(error = %err, "ignoring event line"),
    }
}

/// Read lines until the stream closes, stamping each with the time since `clock`.
pub async fn process_lines<R>(
    reader: R,
    engine: &mut GestureEngine,
    sink: &mut dyn ActionSink,
    clock: Instant,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("failed to read event line")?
    {
        let now_ms = clock.elapsed().as_millis() as u64;
        handle_line(&line, engine, sink, now_ms);
    }
    Ok(())
}

pub async fn run(config: &Config, options: &Options) -> Result<()> {
    let mut engine = config.build_engine()?;
    let mut sink: Box<dyn ActionSink + Send> = if options.dry_run {
        info!("debug mode, actions are logged only");
        Box::new(DryRun)
    } else {
        Box::new(Launcher)
    };
    let clock = Instant::now();

    if options.raw {
        info!("reading gesture events from standard input");
        let stdin = BufReader::new(tokio::io::stdin());
        return tokio::select! {
            result = process_lines(stdin, &mut engine, sink.as_mut(), clock) => result,
            _ = signal::ctrl_c() => {
                info!("Shutdown requested");
                Ok(())
            }
        };
    }

    let setting = options.device.as_deref().or(config.device.as_deref());
    let selection = device::resolve(setting).await?;

    let mut command = Command::new("libinput");
    command.arg("debug-events");
    if let DeviceSelection::Node(node) = &selection {
        command.arg("--device").arg(node);
    }
    let mut child = command
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .context("failed to start libinput debug-events")?;
    let stdout = child
        .stdout
        .take()
        .context("libinput debug-events stdout not captured")?;

    info!(device = ?selection, "listening for gestures");
    tokio::select! {
        result = process_lines(BufReader::new(stdout), &mut engine, sink.as_mut(), clock) => result?,
        _ = signal::ctrl_c() => {
            info!("Shutdown requested");
            return Ok(());
        }
    }

    let status = child
        .wait()
        .await
        .context("failed to wait for libinput debug-events")?;
    if !status.success() {
        warn!("reading touchpad events usually needs membership of the 'input' group");
        bail!("libinput debug-events exited with {status}");
    }
    Ok(())
}
