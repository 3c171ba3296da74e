//! Detection of Windows-style path separators inside a single line of text
//!
//! The scanner is a small state machine over the bytes of one line. It cuts
//! the line into *path runs*: maximal spans of path characters
//! (`[A-Za-z0-9_.-]`) and separators (`\` or `/`), optionally starting with a
//! drive prefix such as `C:`. Quote characters switch between the `Normal`
//! and `InQuotedString` states, and consecutive backslashes are collected
//! while in `InSeparatorRun`.
//!
//! A run is rewritten only when it looks like a path:
//!
//! - it contains at least one backslash, and
//! - it starts with a drive prefix, or at least one backslash group sits
//!   between two real path segments (a segment with a letter, digit or `_`,
//!   or a leading `.`/`..`), and that group is not a C escape such as `\n`
//!   inside a quoted string.
//!
//! Baseline mode leaves runs that already contain `/` alone and turns every
//! backslash into a slash. Aggressive mode also normalizes mixed runs and
//! collapses escaped pairs (`\\` becomes `/`).

use serde::Serialize;

/// One rewritten separator group, located within a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    /// 1-based line number
    pub line_number: usize,
    /// Byte offsets `(start, end)` within the line, line ending excluded
    pub column_span: (usize, usize),
    pub original_fragment: String,
    pub replacement_fragment: String,
}

/// A line-local match produced by [`find_matches`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub start: usize,
    pub end: usize,
    pub original: String,
    pub replacement: String,
}

impl Candidate {
    /// Attach a line number, producing a file-level [`Match`]
    pub fn at_line(self, line_number: usize) -> Match {
        Match {
            line_number,
            column_span: (self.start, self.end),
            original_fragment: self.original,
            replacement_fragment: self.replacement,
        }
    }
}

/// Escape letters that, after an odd number of backslashes inside a string
/// literal, make the backslash an escape rather than a separator.
const ESCAPE_LETTERS: &[u8] = b"nrtbfvae0xuU";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    InSeparatorRun,
    InQuotedString,
}

#[derive(Debug)]
struct Group {
    start: usize,
    end: usize,
    /// Odd-length group right before the active closing quote
    escapes_quote: bool,
}

impl Group {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

#[derive(Debug)]
struct PathRun {
    start: usize,
    /// First byte after the drive prefix (equal to `start` without one)
    body_start: usize,
    end: usize,
    drive: bool,
    quoted: bool,
    has_forward: bool,
    groups: Vec<Group>,
}

/// Find every separator group in `line` that should be rewritten.
///
/// Candidates are returned in ascending, non-overlapping order. Any input
/// is accepted; an empty result simply means nothing path-like was found.
pub fn find_matches(line: &str, aggressive: bool) -> Vec<Candidate> {
    let bytes = line.as_bytes();
    let mut candidates = Vec::new();

    for run in Scanner::new(bytes) {
        if !run.qualifies(bytes, aggressive) {
            continue;
        }
        for group in &run.groups {
            if group.escapes_quote {
                continue;
            }
            let slashes = run.replacement_len(group, aggressive);
            candidates.push(Candidate {
                start: group.start,
                end: group.end,
                original: line[group.start..group.end].to_string(),
                replacement: "/".repeat(slashes),
            });
        }
    }

    candidates
}

/// Apply candidates from [`find_matches`] to the line they came from
pub fn apply_candidates(line: &str, candidates: &[Candidate]) -> String {
    let mut result = String::with_capacity(line.len());
    let mut last = 0;
    for candidate in candidates {
        result.push_str(&line[last..candidate.start]);
        result.push_str(&candidate.replacement);
        last = candidate.end;
    }
    result.push_str(&line[last..]);
    result
}

/// Convenience wrapper: rewrite one line and report how many groups changed
pub fn rewrite_line(line: &str, aggressive: bool) -> (String, usize) {
    let candidates = find_matches(line, aggressive);
    (apply_candidates(line, &candidates), candidates.len())
}

fn is_path_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-')
}

fn is_separator(b: u8) -> bool {
    b == b'\\' || b == b'/'
}

fn is_run_byte(b: u8) -> bool {
    is_path_byte(b) || is_separator(b)
}

fn is_quote(b: u8) -> bool {
    b == b'"' || b == b'\''
}

fn is_drive_prefix(bytes: &[u8], at: usize) -> bool {
    bytes.len() > at + 2
        && bytes[at].is_ascii_alphabetic()
        && bytes[at + 1] == b':'
        && is_separator(bytes[at + 2])
}

fn is_named_segment(segment: &[u8]) -> bool {
    segment.iter().any(|b| b.is_ascii_alphanumeric() || *b == b'_')
}

fn is_dot_segment(segment: &[u8]) -> bool {
    segment == b"." || segment == b".."
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    state: State,
    quote: Option<u8>,
}

impl<'a> Scanner<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            state: State::Normal,
            quote: None,
        }
    }

    fn resting_state(&self) -> State {
        if self.quote.is_some() {
            State::InQuotedString
        } else {
            State::Normal
        }
    }

    fn handle_quote(&mut self, b: u8) {
        match self.quote {
            None => self.quote = Some(b),
            Some(q) if q == b => self.quote = None,
            Some(_) => {}
        }
        self.state = self.resting_state();
    }

    fn read_run(&mut self) -> PathRun {
        let bytes = self.bytes;
        let start = self.pos;
        let quoted = self.state == State::InQuotedString;
        let drive = is_drive_prefix(bytes, start);
        if drive {
            self.pos += 2;
        }
        let body_start = self.pos;

        let mut groups = Vec::new();
        let mut has_forward = false;
        let mut group_start = self.pos;

        loop {
            let next = bytes.get(self.pos).copied();
            match (self.state, next) {
                (State::InSeparatorRun, Some(b'\\')) => self.pos += 1,
                (State::InSeparatorRun, _) => {
                    groups.push(Group {
                        start: group_start,
                        end: self.pos,
                        escapes_quote: false,
                    });
                    self.state = self.resting_state();
                }
                (_, Some(b'\\')) => {
                    group_start = self.pos;
                    self.state = State::InSeparatorRun;
                    self.pos += 1;
                }
                (_, Some(b'/')) => {
                    has_forward = true;
                    self.pos += 1;
                }
                (_, Some(b)) if is_path_byte(b) => self.pos += 1,
                _ => break,
            }
        }

        let end = self.pos;

        // An odd backslash count before the closing quote escapes it, so the
        // string stays open and the quote is consumed here.
        if let (Some(q), Some(last)) = (self.quote, groups.last_mut()) {
            if last.end == end && last.len() % 2 == 1 && bytes.get(end) == Some(&q) {
                last.escapes_quote = true;
                self.pos += 1;
            }
        }

        PathRun {
            start,
            body_start,
            end,
            drive,
            quoted,
            has_forward,
            groups,
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = PathRun;

    fn next(&mut self) -> Option<PathRun> {
        while let Some(&b) = self.bytes.get(self.pos) {
            if is_run_byte(b) {
                return Some(self.read_run());
            }
            if is_quote(b) {
                self.handle_quote(b);
            }
            self.pos += 1;
        }
        None
    }
}

impl PathRun {
    fn qualifies(&self, bytes: &[u8], aggressive: bool) -> bool {
        if self.groups.is_empty() {
            return false;
        }
        if self.has_forward && !aggressive {
            return false;
        }
        if self.drive {
            return true;
        }
        self.groups
            .iter()
            .any(|g| self.is_interior(bytes, g) && !self.is_escape_like(bytes, g))
    }

    fn segment_before(&self, bytes: &[u8], group: &Group) -> (usize, usize) {
        let mut from = group.start;
        while from > self.body_start && is_path_byte(bytes[from - 1]) {
            from -= 1;
        }
        (from, group.start)
    }

    fn segment_after(&self, bytes: &[u8], group: &Group) -> (usize, usize) {
        let mut to = group.end;
        while to < self.end && is_path_byte(bytes[to]) {
            to += 1;
        }
        (group.end, to)
    }

    fn is_interior(&self, bytes: &[u8], group: &Group) -> bool {
        let (left_from, left_to) = self.segment_before(bytes, group);
        let left = &bytes[left_from..left_to];
        let left_ok = is_named_segment(left) || (is_dot_segment(left) && left_from == self.body_start);

        let (right_from, right_to) = self.segment_after(bytes, group);
        let right = &bytes[right_from..right_to];
        let right_ok = is_named_segment(right) || is_dot_segment(right);

        left_ok && right_ok
    }

    fn is_escape_like(&self, bytes: &[u8], group: &Group) -> bool {
        self.quoted
            && group.len() % 2 == 1
            && bytes
                .get(group.end)
                .is_some_and(|b| ESCAPE_LETTERS.contains(b))
    }

    fn replacement_len(&self, group: &Group, aggressive: bool) -> usize {
        let len = group.len();
        if !aggressive {
            return len;
        }
        // Outside string literals a leading `\\` is a UNC prefix, not an escape
        let unc_prefix = !self.quoted && !self.drive && group.start == self.start;
        if unc_prefix { len } else { len.div_ceil(2) }
    }
}
