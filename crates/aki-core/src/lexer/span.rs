//! Source positions for Aki fragments

#![allow(clippy::cast_possible_truncation)] // Fragments are REPL-sized; u32 offsets are plenty

use std::ops::Range;

/// A byte range in a source fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first character
    pub start: u32,
    /// Byte offset one past the last character
    pub end: u32,
}

impl Span {
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`
    #[must_use]
    pub const fn to(self, other: Self) -> Self {
        let start = if self.start < other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end > other.end {
            self.end
        } else {
            other.end
        };
        Self { start, end }
    }

    #[must_use]
    pub const fn as_range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start as u32, range.end as u32)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// 1-based line and column, as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    /// Counted in characters, not bytes
    pub column: u32,
}

impl Location {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, col {}", self.line, self.column)
    }
}

/// Maps byte offsets of one fragment to lines and columns
#[derive(Debug, Clone)]
pub struct LineIndex<'src> {
    source: &'src str,
    line_starts: Vec<u32>,
}

impl<'src> LineIndex<'src> {
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .char_indices()
                .filter(|&(_, c)| c == '\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        Self {
            source,
            line_starts,
        }
    }

    fn line_of(&self, offset: u32) -> usize {
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    /// Location of a byte offset; offsets past the end clamp to the last line
    #[must_use]
    pub fn location(&self, offset: u32) -> Location {
        let offset = offset.min(self.source.len() as u32);
        let line = self.line_of(offset);
        let line_start = self.line_starts[line] as usize;
        let column = self.source[line_start..offset as usize].chars().count() + 1;
        Location::new((line + 1) as u32, column as u32)
    }

    /// Text of the 1-based `line`, without its newline
    #[must_use]
    pub fn line_text(&self, line: u32) -> &'src str {
        let Some(&start) = self.line_starts.get((line as usize).saturating_sub(1)) else {
            return "";
        };
        let rest = &self.source[start as usize..];
        rest.split('\n').next().unwrap_or(rest).trim_end_matches('\r')
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
