//! Process wiring.
//!
//! Three long-lived tasks around two bounded queues:
//!
//! ```text
//! firehose ──(events, cap 30)──▶ dispatcher ──(changedRepos, cap QueueSize)──▶ drain
//!                                     ▲
//!                               repo catalog ◀── bootstrap sweep
//! ```
//!
//! The drain loop runs on the main thread and performs the refetches, which
//! also serialises all fetches per family. Shutdown is a signal flag: the
//! drain loop exits, the queues disconnect, and the workers cascade out.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError};

use crate::archive::FamilyRepository;
use crate::hosting::HostClient;
use crate::index::RepoCatalog;
use crate::monitor::{
    ChangedRepo, FIREHOSE_CAPACITY, run_dispatcher_loop, run_firehose_loop,
};
use crate::{Result, bootstrap, config};

pub fn run() -> Result<()> {
    let cfg = config::load()?;

    let _ = std::fs::create_dir_all(&cfg.data_dir);
    let catalog = RepoCatalog::create(&cfg.data_dir.join("repos.sqlite"))?;
    let writer = catalog.writer()?;
    let reader = catalog.reader()?;

    let client = HostClient::new(&cfg.user_agent, &cfg.github_id, &cfg.github_secret);

    let mains = bootstrap::expand_monitored_set(&cfg.repositories, &client)?;
    tracing::info!("monitoring {} families", mains.len());

    let shutdown = Arc::new(AtomicBool::new(false));
    let _ = signal_hook::flag::register(signal_hook::consts::SIGTERM, shutdown.clone());
    let _ = signal_hook::flag::register(signal_hook::consts::SIGINT, shutdown.clone());

    let (event_tx, event_rx) = channel::bounded(FIREHOSE_CAPACITY);
    let (changed_tx, changed_rx) = channel::bounded::<ChangedRepo>(cfg.queue_size);

    let firehose_handle = std::thread::spawn({
        let client = client.clone();
        let shutdown = Arc::clone(&shutdown);
        move || run_firehose_loop(client, event_tx, &shutdown)
    });

    let dispatcher_handle =
        std::thread::spawn(move || run_dispatcher_loop(event_rx, reader, changed_tx));

    let bootstrap_handle = std::thread::spawn({
        let data_dir = cfg.data_dir.clone();
        let client = client.clone();
        move || bootstrap::initial_sweep(&data_dir, &mains, &writer, &client)
    });

    // Drain loop: refetch each changed member into its family.
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown signal received");
            break;
        }
        match changed_rx.recv_timeout(Duration::from_millis(200)) {
            Ok(changed) => refetch(&cfg.data_dir, &changed),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Disconnect cascade: dropping the drain side unblocks the dispatcher,
    // which unblocks the firehose.
    drop(changed_rx);
    let _ = bootstrap_handle.join();
    let _ = dispatcher_handle.join();
    let _ = firehose_handle.join();

    tracing::info!("stopped");
    Ok(())
}

fn refetch(data_dir: &Path, changed: &ChangedRepo) {
    tracing::info!("refetching {} (family {})", changed.name, changed.main);

    let result = FamilyRepository::open(data_dir, &changed.main)
        .and_then(|mut family| family.fetch(&changed.name, changed.name == changed.main));

    if let Err(e) = result {
        tracing::warn!(
            "refetch of {} failed (retryable: {}): {e}",
            changed.name,
            e.transience().is_retryable(),
        );
    }
}
