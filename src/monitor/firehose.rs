//! Firehose polling loop.
//!
//! The event endpoint returns a sliding window of the most recent public
//! events; "new since last poll" is the set difference between successive
//! windows, keyed by event id. Polls are spaced at least one second apart.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam::channel::{SendError, Sender};

use crate::hosting::{Event, EventSource};

/// Capacity of the firehose → dispatcher channel.
pub const FIREHOSE_CAPACITY: usize = 30;

/// More new events than this in a single round (with warmed-up dedup state)
/// means the finite page is probably dropping events between polls.
const BEHIND_THRESHOLD: usize = 25;

const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Round-over-round dedup state for the public event stream.
pub struct Firehose {
    last_round_ids: HashSet<String>,
    last_round_at: Option<Instant>,
    min_interval: Duration,
}

impl Firehose {
    pub fn new() -> Self {
        Self::with_interval(MIN_POLL_INTERVAL)
    }

    /// Custom poll spacing, for tests.
    pub fn with_interval(min_interval: Duration) -> Self {
        Firehose {
            last_round_ids: HashSet::new(),
            last_round_at: None,
            min_interval,
        }
    }

    /// Sleep out the remainder of the minimum spacing since the previous
    /// round, then stamp this round's start.
    fn pace(&mut self) {
        if let Some(last) = self.last_round_at {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
        self.last_round_at = Some(Instant::now());
    }

    /// One poll round: fetch the window, emit events unseen last round,
    /// roll the dedup set forward. Returns the number of emitted events.
    ///
    /// A source error is logged and leaves both the dedup set and the pacing
    /// clock intact; the loop never crashes on transient API failures. The
    /// only hard error is a disconnected output channel.
    pub fn poll_round(
        &mut self,
        source: &dyn EventSource,
        out: &Sender<Event>,
    ) -> Result<usize, SendError<Event>> {
        self.pace();

        let events = match source.list_events() {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("firehose error: {e}");
                return Ok(0);
            }
        };

        let mut this_round_ids = HashSet::with_capacity(events.len());
        let mut new_count = 0;

        for event in events {
            this_round_ids.insert(event.id.clone());
            if !self.last_round_ids.contains(&event.id) {
                new_count += 1;
                out.send(event)?;
            }
        }

        if new_count > BEHIND_THRESHOLD && !self.last_round_ids.is_empty() {
            tracing::warn!("firehose getting behind: {new_count} new events in one round");
        }

        self.last_round_ids = this_round_ids;
        Ok(new_count)
    }
}

impl Default for Firehose {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll forever, until shutdown is flagged or the dispatcher goes away.
pub fn run_firehose_loop<S: EventSource>(source: S, out: Sender<Event>, shutdown: &AtomicBool) {
    let mut firehose = Firehose::new();
    while !shutdown.load(Ordering::Relaxed) {
        if firehose.poll_round(&source, &out).is_err() {
            break;
        }
    }
}
