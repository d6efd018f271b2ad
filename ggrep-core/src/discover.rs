use ignore::WalkBuilder;
use std::path::{Component, Path};
use tracing::{debug, info, warn};

use crate::queue::{Job, WorkQueue};

/// Outcome of a directory walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    /// Files enqueued as jobs
    pub files: usize,
    /// Directories that could not be listed
    pub errors: usize,
}

/// Walks `root` depth-first and enqueues one [`Job::File`] per non-directory entry.
///
/// Every filter is disabled: hidden files, ignore files and VCS metadata are all
/// walked. Symbolic links are not followed, so a link is enqueued like any other
/// non-directory entry and a link cycle cannot make the walk loop. A directory
/// that cannot be listed is logged and skipped; its siblings and parents are
/// still walked. `add` blocks while the queue is full, so the walk advances at
/// the pace of the workers.
///
/// Paths are the root joined with the entry names, except that a root made only
/// of `.` components is dropped: walking `.` yields `sub/a.txt`, not `./sub/a.txt`.
///
/// Does not call [`WorkQueue::finalize`]; the caller does that once this returns.
pub fn discover(queue: &WorkQueue, root: &Path) -> DiscoveryStats {
    info!("Discovering files under {}", root.display());

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(false)
        .same_file_system(false);

    let mut stats = DiscoveryStats::default();
    let strip_root = is_current_dir(root);

    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Failed to read directory: {}", err);
                stats.errors += 1;
                continue;
            }
        };

        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());

        if entry.depth() == 0 {
            if !is_dir {
                warn!("Not a directory: {}", entry.path().display());
                stats.errors += 1;
            }
            continue;
        }

        if !is_dir {
            let path = entry.into_path();
            let path = if strip_root {
                match path.strip_prefix(root) {
                    Ok(relative) => relative.to_path_buf(),
                    Err(_) => path,
                }
            } else {
                path
            };
            queue.add(Job::File(path));
            stats.files += 1;
        }
    }

    debug!(
        "Discovery finished: {} files, {} unreadable directories",
        stats.files, stats.errors
    );
    stats
}

fn is_current_dir(root: &Path) -> bool {
    let mut components = root.components().peekable();
    components.peek().is_some() && components.all(|c| c == Component::CurDir)
}
