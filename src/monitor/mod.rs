//! Change monitor: firehose consumer + dispatcher.
//!
//! The firehose loop polls the global public-event stream and forwards
//! events not seen in the previous round; the dispatcher filters them down
//! to pushes on monitored repositories and queues refetch work. The bounded
//! `changedRepos` channel between dispatcher and fetch drain is the
//! backpressure boundary: when it fills, the dispatcher blocks, the firehose
//! consumer falls behind, and the "getting behind" warning fires.

mod dispatcher;
mod firehose;

pub use dispatcher::{ChangedRepo, run_dispatcher_loop};
pub use firehose::{FIREHOSE_CAPACITY, Firehose, run_firehose_loop};
