//! The search pipeline.
//!
//! ```text
//! discoverer ──Job──▶ WorkQueue ──▶ worker × N ──Match──▶ results ──▶ collector ──▶ sink
//!                     (bounded)                          (bounded)
//! ```
//!
//! The discoverer enqueues one [`Job::File`](crate::queue::Job) per file and,
//! once the walk has returned, one shutdown per worker. Each worker exits on
//! the shutdown it dequeues. A coordinator joins the workers and then drops the
//! last results sender, which ends the collector's loop once the channel is
//! empty.
pub mod collector;
pub mod engine;
pub mod processor;
pub mod worker;

pub use collector::collect;
pub use engine::{search, search_collect};
pub use processor::{find_in_file, FileProcessor};
pub use worker::{run_worker, WorkerStats};
