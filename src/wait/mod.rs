use crate::core::{Document, ReadyState, WaitConfig};
use crate::errors::{AutomationError, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// What the settle loop observed when it gave up. Carried by
/// `AutomationError::Timeout` so a failed wait can be diagnosed without
/// re-running.
#[derive(Debug, Clone)]
pub struct SettleDiagnostics {
    /// Last observed loading state.
    pub state: ReadyState,
    /// Label of the document or frame that was still loading.
    pub pending_frame: Option<String>,
    /// How long the loop waited before giving up.
    pub waited: Duration,
    pub checked_at: DateTime<Utc>,
}

impl fmt::Display for SettleDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "state '{}' after {:?}",
            self.state, self.waited
        )?;
        if let Some(frame) = &self.pending_frame {
            write!(f, ", still loading: {}", frame)?;
        }
        write!(f, " (checked at {})", self.checked_at.to_rfc3339())
    }
}

/// One observation of a document tree's loading state.
#[derive(Debug, Clone)]
pub struct SettleProbe {
    pub settled: bool,
    pub state: ReadyState,
    pub pending_frame: Option<String>,
}

/// A document is settled only when itself and all descendant frames report
/// `Complete`.
pub fn settle_probe<D: Document>(document: &D) -> Result<SettleProbe> {
    let state = document.ready_state()?;
    if state != ReadyState::Complete {
        return Ok(SettleProbe {
            settled: false,
            state,
            pending_frame: Some(document.label()),
        });
    }
    for frame in document.frames()? {
        let probe = settle_probe(&frame)?;
        if !probe.settled {
            return Ok(probe);
        }
    }
    Ok(SettleProbe {
        settled: true,
        state: ReadyState::Complete,
        pending_frame: None,
    })
}

/// Block until the document tree settles or the configured timeout elapses.
///
/// A synchronous poll loop on the calling thread: probe, sleep the
/// configured interval, repeat. Returns as soon as a probe observes
/// `Complete` everywhere; a page that settles early is not held for the
/// full budget. Probe failures (a navigation can tear the document out from
/// under the query) are treated as "not settled yet" and retried, matching
/// the recoverable nature of the timeout itself.
pub fn wait_for_complete<D: Document>(document: &D, wait: &WaitConfig) -> Result<()> {
    let started = Instant::now();
    let timeout = wait.timeout();
    let mut last = SettleProbe {
        settled: false,
        state: ReadyState::Loading,
        pending_frame: None,
    };
    loop {
        match settle_probe(document) {
            Ok(probe) if probe.settled => {
                debug!(
                    label = %document.label(),
                    waited = ?started.elapsed(),
                    "document settled"
                );
                return Ok(());
            }
            Ok(probe) => last = probe,
            Err(err) => {
                warn!(error = %err, "settle probe failed, retrying");
            }
        }
        if started.elapsed() >= timeout {
            return Err(AutomationError::Timeout(SettleDiagnostics {
                state: last.state,
                pending_frame: last.pending_frame,
                waited: started.elapsed(),
                checked_at: Utc::now(),
            }));
        }
        thread::sleep(wait.poll_interval());
    }
}
