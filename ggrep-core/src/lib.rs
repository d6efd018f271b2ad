pub mod config;
pub mod discover;
pub mod errors;
pub mod queue;
pub mod results;
pub mod search;

pub use crate::config::{CliOverrides, EncodingMode, SearchConfig};
pub use discover::{discover, DiscoveryStats};
pub use errors::{SearchError, SearchResult};
pub use queue::{Job, QueueStats, WorkQueue};
pub use results::{Match, SearchSummary};
pub use search::{find_in_file, search, search_collect};
