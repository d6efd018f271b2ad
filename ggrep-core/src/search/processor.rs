use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{trace, warn};

use crate::config::EncodingMode;
use crate::errors::SearchError;
use crate::results::Match;

const BUFFER_CAPACITY: usize = 65536;
const LINE_CAPACITY: usize = 256;

/// Searches single files for lines containing a literal term
#[derive(Debug, Clone)]
pub struct FileProcessor {
    term: String,
    encoding_mode: EncodingMode,
}

impl FileProcessor {
    /// Creates a new FileProcessor for the given term
    pub fn new(term: impl Into<String>, encoding_mode: EncodingMode) -> Self {
        Self {
            term: term.into(),
            encoding_mode,
        }
    }

    /// Returns every line of `path` that contains the term, in file order.
    ///
    /// `None` means nothing to report: either no line matched or the file could
    /// not be opened (which is logged). An empty `Vec` is never returned.
    pub fn find_in_file(&self, path: &Path) -> Option<Vec<Match>> {
        trace!("Processing file: {}", path.display());

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("{}", SearchError::from_io(path, e));
                return None;
            }
        };

        let matches = self.find_in_reader(BufReader::with_capacity(BUFFER_CAPACITY, file), path);
        if matches.is_empty() {
            None
        } else {
            Some(matches)
        }
    }

    /// Scans `reader` line by line, attributing matches to `path`.
    ///
    /// Lines end at `\n`; a trailing `\r` is dropped and a last line without a
    /// terminator still counts. A read error, or invalid UTF-8 under
    /// [`EncodingMode::FailFast`], ends the scan early: the matches found up to
    /// that line are kept and the truncation is logged.
    pub fn find_in_reader<R: BufRead>(&self, mut reader: R, path: &Path) -> Vec<Match> {
        let mut matches = Vec::new();
        let mut buffer = Vec::with_capacity(LINE_CAPACITY);
        let mut line_number = 0;

        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        "Stopped reading {} after line {}: {}",
                        path.display(),
                        line_number,
                        e
                    );
                    break;
                }
            }
            line_number += 1;
            strip_line_terminator(&mut buffer);

            let Some(line) = self.decode(&buffer) else {
                warn!(
                    "Invalid UTF-8 at line {} of {}, skipping the rest of the file",
                    line_number,
                    path.display()
                );
                break;
            };

            if line.contains(self.term.as_str()) {
                trace!("Found match at line {}: {}", line_number, line);
                matches.push(Match::new(path, line_number, line.into_owned()));
            }
        }

        matches
    }

    fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self.encoding_mode {
            EncodingMode::FailFast => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            EncodingMode::Lossy => Some(String::from_utf8_lossy(bytes)),
        }
    }
}

fn strip_line_terminator(buffer: &mut Vec<u8>) {
    if buffer.last() == Some(&b'\n') {
        buffer.pop();
        if buffer.last() == Some(&b'\r') {
            buffer.pop();
        }
    }
}

/// Searches `path` for `term` with lossy UTF-8 decoding.
///
/// Shorthand for `FileProcessor::new(term, EncodingMode::Lossy).find_in_file(path)`.
pub fn find_in_file(path: &Path, term: &str) -> Option<Vec<Match>> {
    FileProcessor::new(term, EncodingMode::Lossy).find_in_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{self, Cursor, Read};
    use tempfile::tempdir;

    /// Yields `data`, then fails every later read.
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "device went away"));
            }
            Ok(n)
        }
    }

    #[test]
    fn test_matching_lines_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "foo\nbar\nfoobar\n").unwrap();

        let matches = find_in_file(&path, "foo").unwrap();
        assert_eq!(
            matches,
            vec![Match::new(&path, 1, "foo"), Match::new(&path, 3, "foobar")]
        );
    }

    #[test]
    fn test_no_match_returns_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("b.txt");
        fs::write(&path, "baz\n").unwrap();

        assert!(find_in_file(&path, "foo").is_none());
    }

    #[test]
    fn test_empty_file_returns_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "").unwrap();

        assert!(find_in_file(&path, "foo").is_none());
    }

    #[test]
    fn test_missing_file_returns_none() {
        let dir = tempdir().unwrap();
        assert!(find_in_file(&dir.path().join("nope.txt"), "foo").is_none());
    }

    #[test]
    fn test_last_line_without_newline_counts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.txt");
        fs::write(&path, "one\ntwo\nthree foo").unwrap();

        let matches = find_in_file(&path, "foo").unwrap();
        assert_eq!(matches, vec![Match::new(&path, 3, "three foo")]);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let processor = FileProcessor::new("x", EncodingMode::Lossy);
        let input = Cursor::new("a\r\n\r\nx\r\n\nxx");

        let matches = processor.find_in_reader(input, Path::new("mem"));
        let numbers: Vec<_> = matches.iter().map(|m| m.line_number).collect();
        assert_eq!(numbers, vec![3, 5]);
        assert_eq!(matches[0].line, "x");
        assert_eq!(matches[1].line, "xx");
    }

    #[test]
    fn test_match_is_case_sensitive_and_literal() {
        let processor = FileProcessor::new("a.c", EncodingMode::Lossy);
        let input = Cursor::new("abc\nA.C\na.c\n");

        let matches = processor.find_in_reader(input, Path::new("mem"));
        assert_eq!(matches, vec![Match::new("mem", 3, "a.c")]);
    }

    #[test]
    fn test_every_occurrence_line_reported_once() {
        let processor = FileProcessor::new("ab", EncodingMode::Lossy);
        let input = Cursor::new("ab ab ab\n");

        let matches = processor.find_in_reader(input, Path::new("mem"));
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_lossy_mode_searches_past_invalid_utf8() {
        let processor = FileProcessor::new("needle", EncodingMode::Lossy);
        let input = Cursor::new(b"\xff\xfe junk\nneedle here\n".to_vec());

        let matches = processor.find_in_reader(input, Path::new("bin"));
        assert_eq!(matches, vec![Match::new("bin", 2, "needle here")]);
    }

    #[test]
    fn test_failfast_mode_keeps_matches_before_invalid_line() {
        let processor = FileProcessor::new("needle", EncodingMode::FailFast);
        let input = Cursor::new(b"needle 1\n\xff\xfe\nneedle 3\n".to_vec());

        let matches = processor.find_in_reader(input, Path::new("bin"));
        assert_eq!(matches, vec![Match::new("bin", 1, "needle 1")]);
    }

    #[test]
    fn test_read_error_keeps_partial_results() {
        let processor = FileProcessor::new("foo", EncodingMode::Lossy);
        let reader = FailingReader {
            data: Cursor::new(b"foo\nbar\nfoo again\n".to_vec()),
        };

        let matches = processor.find_in_reader(BufReader::new(reader), Path::new("flaky"));
        let numbers: Vec<_> = matches.iter().map(|m| m.line_number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn test_many_lines_keep_ascending_numbers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.txt");
        let mut content = String::new();
        for i in 1..=2000 {
            if i % 7 == 0 {
                content.push_str(&format!("line {} has marker\n", i));
            } else {
                content.push_str(&format!("line {}\n", i));
            }
        }
        fs::write(&path, content).unwrap();

        let matches = find_in_file(&path, "marker").unwrap();
        let numbers: Vec<_> = matches.iter().map(|m| m.line_number).collect();
        let expected: Vec<_> = (1..=2000).filter(|i| i % 7 == 0).collect();
        assert_eq!(numbers, expected);
    }
}
