//! Dispatcher loop: firehose events → refetch queue.

use crossbeam::channel::{Receiver, Sender};

use crate::hosting::{Event, PUSH_EVENT};
use crate::index::CatalogReader;

/// A monitored repository that just changed, with its family root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedRepo {
    pub name: String,
    pub main: String,
}

/// Queue length at which the "filling up" warning starts firing: above 90%
/// of capacity.
fn over_watermark(len: usize, capacity: usize) -> bool {
    len > capacity / 10 * 9
}

/// Consume firehose events until the channel closes.
///
/// Push events on monitored repositories are forwarded as [`ChangedRepo`];
/// everything else is dropped. The send blocks when the queue is full: that
/// is the backpressure boundary slowing the whole monitor down.
pub fn run_dispatcher_loop(
    events: Receiver<Event>,
    catalog: CatalogReader,
    changed: Sender<ChangedRepo>,
) {
    for event in events {
        if event.event_type != PUSH_EVENT {
            continue;
        }
        let name = event.repo.name;

        match catalog.lookup_main(&name) {
            Ok(None) => {
                tracing::debug!("push to unmonitored {name}");
            }
            Err(e) => {
                tracing::warn!("name lookup failed for {name}: {e}");
            }
            Ok(Some(main)) => {
                if changed.send(ChangedRepo { name, main }).is_err() {
                    // Drain side is gone; shut down.
                    return;
                }
                if let Some(capacity) = changed.capacity() {
                    let len = changed.len();
                    if over_watermark(len, capacity) {
                        tracing::warn!("queue is filling up: {len} of {capacity}");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossbeam::channel;

    use super::*;
    use crate::hosting::EventRepo;
    use crate::index::RepoCatalog;

    fn push_event(name: &str) -> Event {
        Event {
            id: "1".to_string(),
            event_type: PUSH_EVENT.to_string(),
            repo: EventRepo {
                name: name.to_string(),
            },
        }
    }

    fn dispatch(events: Vec<Event>) -> Vec<ChangedRepo> {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = RepoCatalog::create(&dir.path().join("repos.sqlite")).expect("create");
        let writer = catalog.writer().expect("writer");
        writer.insert("a/b", "a/b").expect("insert");
        writer.insert("c/b", "a/b").expect("insert");

        let (event_tx, event_rx) = channel::unbounded();
        let (changed_tx, changed_rx) = channel::bounded(16);
        for event in events {
            event_tx.send(event).expect("send");
        }
        drop(event_tx);

        run_dispatcher_loop(event_rx, catalog.reader().expect("reader"), changed_tx);
        changed_rx.try_iter().collect()
    }

    #[test]
    fn push_to_monitored_fork_is_enqueued_with_its_main() {
        let changed = dispatch(vec![push_event("c/b")]);
        assert_eq!(
            changed,
            vec![ChangedRepo {
                name: "c/b".to_string(),
                main: "a/b".to_string(),
            }]
        );
    }

    #[test]
    fn push_to_unmonitored_repo_is_dropped() {
        assert_eq!(dispatch(vec![push_event("z/z")]), Vec::new());
    }

    #[test]
    fn non_push_events_are_dropped() {
        let mut event = push_event("a/b");
        event.event_type = "WatchEvent".to_string();
        assert_eq!(dispatch(vec![event]), Vec::new());
    }

    #[test]
    fn watermark_fires_above_ninety_percent() {
        assert!(!over_watermark(27, 30));
        assert!(over_watermark(28, 30));
        assert!(over_watermark(30, 30));
        assert!(!over_watermark(90, 100));
        assert!(over_watermark(91, 100));
    }
}
