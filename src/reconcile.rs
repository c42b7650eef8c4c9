//! Status reconciliation — overdue pending occurrences become missed.
//!
//! The sweep is global (no per-user filter), idempotent, and best-effort:
//! read paths invoke it opportunistically and never fail because of it,
//! while a background task owns steady-state reconciliation with its own
//! shutdown channel and failure backoff.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use rusqlite::{params, Connection};
use tokio::sync::oneshot;

use crate::core_state::{CoreError, CoreState};
use crate::db::DatabaseError;
use crate::models::reminder::format_remind_at;

/// Cap for failure backoff, as a multiple of the configured interval.
const MAX_BACKOFF_MULTIPLIER: u32 = 8;

/// Transition every pending occurrence scheduled strictly before `now`
/// to missed. Returns the number of transitions; zero on a repeat call
/// with no elapsed time.
pub fn sweep_missed(conn: &Connection, now: NaiveDateTime) -> Result<usize, DatabaseError> {
    let transitioned = conn.execute(
        "UPDATE reminders SET status = 'missed'
         WHERE status = 'pending' AND remind_at < ?1",
        params![format_remind_at(&now)],
    )?;
    Ok(transitioned)
}

/// Run one sweep against the shared store at the current wall-clock.
fn run_sweep(core: &CoreState) -> Result<usize, CoreError> {
    let conn = core.open_db()?;
    let transitioned = sweep_missed(&conn, Local::now().naive_local())?;
    Ok(transitioned)
}

/// Opportunistic sweep ahead of a current-state read.
///
/// Failures are logged and swallowed; the read proceeds with stale data.
pub fn sweep_best_effort(core: &CoreState) {
    match run_sweep(core) {
        Ok(0) => {}
        Ok(transitioned) => {
            tracing::debug!(transitioned, "Marked overdue reminders as missed");
        }
        Err(e) => tracing::warn!("Reconciliation sweep failed: {e}"),
    }
}

/// Handle to the background sweeper task.
pub struct Sweeper {
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl Sweeper {
    /// Signal the sweeper loop to stop.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Reconciliation sweeper shutdown signal sent");
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn the periodic reconciliation loop.
///
/// Sweeps every `interval`; on store failure the delay doubles up to
/// `MAX_BACKOFF_MULTIPLIER`× and resets after the next success.
pub fn spawn_sweeper(core: Arc<CoreState>, interval: Duration) -> Sweeper {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let mut delay = interval;
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    tracing::info!("Reconciliation sweeper stopping");
                    break;
                }
                _ = tokio::time::sleep(delay) => {
                    delay = match run_sweep(&core) {
                        Ok(transitioned) => {
                            if transitioned > 0 {
                                tracing::debug!(
                                    transitioned,
                                    "Background sweep marked overdue reminders as missed"
                                );
                            }
                            interval
                        }
                        Err(e) => {
                            let next = (delay * 2).min(interval * MAX_BACKOFF_MULTIPLIER);
                            tracing::warn!(
                                "Background sweep failed, backing off to {}s: {e}",
                                next.as_secs()
                            );
                            next
                        }
                    };
                }
            }
        }
    });

    Sweeper {
        shutdown_tx: Some(shutdown_tx),
    }
}
