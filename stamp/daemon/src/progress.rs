//! Measurement window
//!
//! Waits for the configured duration or a shutdown signal, whichever comes
//! first, and calls back every progress interval in between.

use anyhow::{Context, Result};
use std::{future::Future, io, num::NonZeroU64, time::Duration};
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};

/// How the window ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEnd {
    /// Configured duration reached
    Elapsed,
    /// Shutdown signal received
    Interrupted,
}

/// Measurement window configuration
#[derive(Debug, Clone, Copy)]
pub struct RunWindow {
    /// `None` runs until the shutdown signal
    duration: Option<Duration>,
    progress_interval: Duration,
}

impl RunWindow {
    /// `duration_secs == 0` means no limit
    pub fn new(duration_secs: u64, progress_interval_secs: NonZeroU64) -> Self {
        Self {
            duration: (duration_secs > 0).then(|| Duration::from_secs(duration_secs)),
            progress_interval: Duration::from_secs(progress_interval_secs.get()),
        }
    }

    pub fn with_durations(duration: Option<Duration>, progress_interval: Duration) -> Self {
        Self {
            duration,
            progress_interval,
        }
    }

    /// Block until the window closes
    ///
    /// `on_progress` receives the time elapsed since the window opened.
    pub async fn wait<S, F>(&self, shutdown: S, mut on_progress: F) -> Result<WindowEnd>
    where
        S: Future<Output = io::Result<()>>,
        F: FnMut(Duration),
    {
        let start = Instant::now();
        let deadline = async {
            match self.duration {
                Some(d) => sleep(d).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);
        tokio::pin!(shutdown);

        let mut ticker = interval(self.progress_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = &mut deadline => return Ok(WindowEnd::Elapsed),
                res = &mut shutdown => {
                    res.context("Failed to listen for shutdown signal")?;
                    return Ok(WindowEnd::Interrupted);
                }
                _ = ticker.tick() => on_progress(start.elapsed()),
            }
        }
    }
}
