//! Core types used throughout the project.

/// A range in catalog source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SourceRange {
    /// Start of the range (inclusive).
    pub start: SourcePosition,
    /// End of the range (inclusive).
    pub end: SourcePosition,
}

/// A position in catalog source text (0-indexed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    /// 0-indexed line.
    pub line: u32,
    /// 0-indexed character within the line.
    pub character: u32,
}

impl SourcePosition {
    /// Position at the start of the given line.
    #[must_use]
    pub const fn line_start(line: u32) -> Self {
        Self { line, character: 0 }
    }
}

impl SourceRange {
    /// Range covering the given lines in full.
    #[must_use]
    pub const fn lines(start_line: u32, end_line: u32) -> Self {
        Self {
            start: SourcePosition::line_start(start_line),
            end: SourcePosition { line: end_line, character: u32::MAX },
        }
    }

    /// Checks if a position is within this range.
    #[must_use]
    pub const fn contains(&self, position: SourcePosition) -> bool {
        if position.line < self.start.line {
            return false;
        }
        if position.line == self.start.line && position.character < self.start.character {
            return false;
        }
        if position.line > self.end.line {
            return false;
        }
        if position.line == self.end.line && position.character > self.end.character {
            return false;
        }
        true
    }

    /// Checks if a line is within this range.
    #[must_use]
    pub const fn contains_line(&self, line: u32) -> bool {
        self.start.line <= line && line <= self.end.line
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    const fn pos(line: u32, character: u32) -> SourcePosition {
        SourcePosition { line, character }
    }

    const fn range(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> SourceRange {
        SourceRange { start: pos(start_line, start_char), end: pos(end_line, end_char) }
    }

    #[rstest]
    #[case::before_start_line(pos(0, 5), range(1, 5, 2, 10), false)]
    #[case::before_start_char(pos(1, 4), range(1, 5, 2, 10), false)]
    #[case::at_start(pos(1, 5), range(1, 5, 2, 10), true)]
    #[case::middle_line(pos(1, 10), range(1, 5, 2, 10), true)]
    #[case::at_end(pos(2, 10), range(1, 5, 2, 10), true)]
    #[case::after_end_char(pos(2, 11), range(1, 5, 2, 10), false)]
    #[case::after_end_line(pos(3, 0), range(1, 5, 2, 10), false)]
    fn test_contains(
        #[case] position: SourcePosition,
        #[case] range: SourceRange,
        #[case] expected: bool,
    ) {
        assert_that!(range.contains(position), eq(expected));
    }

    #[googletest::test]
    fn test_default_range_covers_only_line_zero() {
        let range = SourceRange::default();

        expect_that!(range.contains(pos(0, 0)), eq(true));
        expect_that!(range.contains_line(0), eq(true));
        expect_that!(range.contains_line(1), eq(false));
    }

    #[rstest]
    #[case::before(0, false)]
    #[case::at_start(1, true)]
    #[case::middle(2, true)]
    #[case::at_end(3, true)]
    #[case::after(4, false)]
    fn test_contains_line(#[case] line: u32, #[case] expected: bool) {
        let range = SourceRange::lines(1, 3);
        assert_that!(range.contains_line(line), eq(expected));
    }
}
