//! Transfer progress reporting.
//!
//! Raw progress goes straight to stderr, bypassing the tracing subscriber:
//! sideband data is the remote's own text (already human-readable, already
//! line-oriented), and transfer counters redraw a single `\r` line.

use std::io::Write;

use git2::RemoteCallbacks;

/// Build callbacks for one connection attempt.
///
/// git2 callbacks are consumed by the operation they are attached to, so a
/// fresh set is built for every connect/download/fetch.
pub(crate) fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();

    callbacks.sideband_progress(|data| {
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(data);
        let _ = stderr.flush();
        true
    });

    callbacks.transfer_progress(|progress| {
        if progress.total_objects() > 0 {
            let mut stderr = std::io::stderr();
            let _ = write!(
                stderr,
                "\rObjects: {} / {} (indexed {})",
                progress.received_objects(),
                progress.total_objects(),
                progress.indexed_objects(),
            );
            let _ = stderr.flush();
        }
        true
    });

    callbacks
}
