//! Long-running mode: scheduler, event printer and stdin commands.

use std::sync::Arc;

use aus_emergency_reconcile::DomainEvent;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::commands::{Command, CommandOutcome};
use crate::context::MonitorContext;
use crate::scheduler;

/// Prints `value` as one JSON line on stdout.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn print_json_line<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Prints `value` as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn print_json_pretty<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_event(event: &DomainEvent) {
    if let Err(e) = print_json_line(event) {
        log::error!("Failed to serialize {}: {e}", event.event_type);
    }
}

/// Prints every event already buffered in `events` without waiting for more.
/// Returns how many were printed.
fn drain_pending(events: &mut broadcast::Receiver<DomainEvent>) -> usize {
    let mut printed = 0;
    loop {
        match events.try_recv() {
            Ok(event) => {
                print_event(&event);
                printed += 1;
            }
            Err(TryRecvError::Lagged(skipped)) => {
                log::warn!("Event printer lagged, {skipped} event(s) dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => return printed,
        }
    }
}

/// Prints events until `stop` fires, then flushes what is still buffered.
fn spawn_printer(
    mut events: broadcast::Receiver<DomainEvent>,
    mut stop: oneshot::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Ok(event) => print_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Event printer lagged, {skipped} event(s) dropped");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = &mut stop => {
                    let printed = drain_pending(&mut events);
                    log::debug!("Event printer flushed {printed} pending event(s)");
                    break;
                }
            }
        }
    })
}

/// Handles one stdin line. Returns `false` when the console should stop.
async fn handle_line(context: &MonitorContext, line: &str) -> bool {
    if line.trim().is_empty() {
        return true;
    }

    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(e) => {
            log::warn!("{e}");
            return true;
        }
    };

    match context.execute(command).await {
        Ok(CommandOutcome::Events(events)) => {
            log::info!("{line}: {} event(s)", events.len());
        }
        Ok(CommandOutcome::Diagnostics(diagnostics)) => {
            if let Err(e) = print_json_line(&diagnostics) {
                log::error!("Failed to serialize diagnostics: {e}");
            }
        }
        Ok(CommandOutcome::Quit) => return false,
        Err(e) => log::warn!("{e}"),
    }
    true
}

/// Runs until `quit`, end of input or Ctrl-C.
///
/// Performs a first refresh of every entry, then hands polling over to the
/// scheduler while reading commands from stdin. Events are printed as JSON
/// lines.
///
/// # Errors
///
/// Returns an error if reading stdin fails.
pub async fn run(context: Arc<MonitorContext>) -> Result<(), std::io::Error> {
    let (stop_printer, stop) = oneshot::channel();
    let printer = spawn_printer(context.subscribe(), stop);

    context.refresh_all().await;
    let tasks = scheduler::spawn(&context);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let result = loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !handle_line(&context, &line).await {
                        break Ok(());
                    }
                }
                Ok(None) => {
                    log::info!("End of input, shutting down");
                    break Ok(());
                }
                Err(e) => break Err(e),
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    log::error!("Failed to listen for Ctrl-C: {e}");
                }
                log::info!("Interrupted, shutting down");
                break Ok(());
            }
        }
    };

    context.shutdown().await;
    for task in tasks {
        if let Err(e) = task.await {
            log::error!("Poll task failed: {e}");
        }
    }
    if stop_printer.send(()).is_err() {
        log::debug!("Event printer already stopped");
    }
    if let Err(e) = printer.await {
        log::error!("Event printer failed: {e}");
    }

    result
}
