/// Search result types.
///
/// A [`Match`] is created by a worker, moved through the results channel, and
/// consumed once by the collector. A [`SearchSummary`] is the aggregate the
/// pipeline hands back when the collector has drained the channel.
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// A single line that contains the search term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Match {
    /// The file the line was read from
    pub path: PathBuf,
    /// 1-based line number
    pub line_number: usize,
    /// The line content, without its line terminator
    pub line: String,
}

impl Match {
    pub fn new(path: impl Into<PathBuf>, line_number: usize, line: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line_number,
            line: line.into(),
        }
    }
}

/// Renders `path[line_number]:line`
impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]:{}",
            self.path.display(),
            self.line_number,
            self.line
        )
    }
}

/// Aggregate counters for a completed search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSummary {
    /// Files handed to the workers
    pub files_searched: usize,
    /// Files that produced at least one match
    pub files_with_matches: usize,
    /// Matches delivered to the sink
    pub total_matches: usize,
    /// Directories that could not be listed
    pub walk_errors: usize,
}

impl SearchSummary {
    /// Creates a new empty summary
    pub fn new() -> Self {
        Default::default()
    }

    /// Records one match coming off the results channel
    pub fn record_match(&mut self, m: &Match, seen_files: &mut HashSet<PathBuf>) {
        self.total_matches += 1;
        if !seen_files.contains(&m.path) {
            seen_files.insert(m.path.clone());
            self.files_with_matches += 1;
        }
    }
}

impl fmt::Display for SearchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found {} matches in {} files",
            self.total_matches, self.files_with_matches
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_display() {
        let m = Match::new("dir/a.txt", 3, "foobar");
        assert_eq!(m.to_string(), "dir/a.txt[3]:foobar");
    }

    #[test]
    fn test_match_display_keeps_line_verbatim() {
        let m = Match::new("a.txt", 12, "  x[1]: foo  ");
        assert_eq!(m.to_string(), "a.txt[12]:  x[1]: foo  ");
    }

    #[test]
    fn test_record_match_counts_files_once() {
        let mut summary = SearchSummary::new();
        let mut seen = HashSet::new();

        summary.record_match(&Match::new("a.txt", 1, "foo"), &mut seen);
        summary.record_match(&Match::new("a.txt", 3, "foobar"), &mut seen);
        summary.record_match(&Match::new("b.txt", 7, "foo"), &mut seen);

        assert_eq!(summary.total_matches, 3);
        assert_eq!(summary.files_with_matches, 2);
    }

    #[test]
    fn test_summary_display() {
        let summary = SearchSummary {
            files_searched: 5,
            files_with_matches: 3,
            total_matches: 5,
            walk_errors: 1,
        };
        assert_eq!(summary.to_string(), "Found 5 matches in 3 files");
    }
}
