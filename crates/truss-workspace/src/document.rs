//! Text document representation with line indexing.
//!
//! [`TextDocument`] stores document content with version tracking.
//! Pre-computed line starts make position/offset conversion cheap, which
//! matters on the edit path where every ranged change needs an offset pair.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Text change range is outside the document")]
    InvalidRange,
}

/// A line/character position inside a document, zero-based.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    #[must_use]
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// One edit: replace `range` with `text`, or the whole document when
/// `range` is absent.
#[derive(Clone, Debug)]
pub struct TextChange {
    pub range: Option<Range>,
    pub text: String,
}

impl TextChange {
    #[must_use]
    pub fn full(text: impl Into<String>) -> Self {
        Self {
            range: None,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            range: Some(range),
            text: text.into(),
        }
    }
}

/// Pre-computed line start offsets for position/offset conversion.
#[derive(Clone, Debug)]
pub struct LineIndex {
    line_starts: Vec<u32>,
    length: u32,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let mut pos = 0;

        for c in text.chars() {
            pos += u32::try_from(c.len_utf8()).unwrap_or(0);
            if c == '\n' {
                line_starts.push(pos);
            }
        }

        Self {
            line_starts,
            length: pos,
        }
    }

    #[must_use]
    pub fn offset(&self, position: Position) -> Option<u32> {
        let line_start = self.line_starts.get(position.line as usize)?;
        let offset = line_start + position.character;
        (offset <= self.length).then_some(offset)
    }

    #[must_use]
    pub fn position(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        };

        let line_start = self.line_starts[line];
        Position::new(u32::try_from(line).unwrap_or(0), offset - line_start)
    }

    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<u32> {
        self.line_starts.get(line).copied()
    }

    #[must_use]
    pub fn length(&self) -> u32 {
        self.length
    }
}

/// Document content plus the version counter that tracks edits.
#[derive(Clone, Debug)]
pub struct TextDocument {
    content: String,
    version: i32,
    line_index: LineIndex,
}

impl TextDocument {
    #[must_use]
    pub fn new(content: impl Into<String>, version: i32) -> Self {
        let content = content.into();
        let line_index = LineIndex::new(&content);
        Self {
            content,
            version,
            line_index,
        }
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn version(&self) -> i32 {
        self.version
    }

    #[must_use]
    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    #[must_use]
    pub fn get_line(&self, line: u32) -> Option<&str> {
        let start = self.line_index.line_start(line as usize)?;
        let end = self
            .line_index
            .line_start(line as usize + 1)
            .unwrap_or(self.line_index.length);

        self.content.get(start as usize..end as usize)
    }

    /// Apply edits in order and bump the version.
    ///
    /// A failed change leaves the document untouched; ranged changes are
    /// resolved against the content as previous changes left it.
    pub fn apply(&mut self, changes: &[TextChange]) -> Result<i32, EditError> {
        let mut content = self.content.clone();

        for change in changes {
            if let Some(range) = change.range {
                let index = LineIndex::new(&content);
                let start = index
                    .offset(range.start)
                    .ok_or(EditError::InvalidRange)? as usize;
                let end = index.offset(range.end).ok_or(EditError::InvalidRange)? as usize;
                if start > end {
                    return Err(EditError::InvalidRange);
                }

                let mut updated =
                    String::with_capacity(content.len() - (end - start) + change.text.len());
                updated.push_str(&content[..start]);
                updated.push_str(&change.text);
                updated.push_str(&content[end..]);
                content = updated;
            } else {
                content.clone_from(&change.text);
            }
        }

        self.line_index = LineIndex::new(&content);
        self.content = content;
        self.version += 1;
        Ok(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_offsets() {
        let index = LineIndex::new("ab\ncd\n");
        assert_eq!(index.offset(Position::new(0, 0)), Some(0));
        assert_eq!(index.offset(Position::new(1, 1)), Some(4));
        assert_eq!(index.offset(Position::new(2, 0)), Some(6));
        assert_eq!(index.offset(Position::new(3, 0)), None);
    }

    #[test]
    fn test_line_index_position_round_trip() {
        let index = LineIndex::new("one\ntwo\nthree");
        for offset in [0, 3, 4, 8, 12] {
            let position = index.position(offset);
            assert_eq!(index.offset(position), Some(offset));
        }
    }

    #[test]
    fn test_get_line() {
        let document = TextDocument::new("first\nsecond\n", 0);
        assert_eq!(document.get_line(0), Some("first\n"));
        assert_eq!(document.get_line(1), Some("second\n"));
        assert_eq!(document.get_line(2), Some(""));
        assert_eq!(document.get_line(3), None);
    }

    #[test]
    fn test_apply_full_replacement() {
        let mut document = TextDocument::new("old", 0);
        let version = document.apply(&[TextChange::full("new content")]).unwrap();
        assert_eq!(document.content(), "new content");
        assert_eq!(version, 1);
    }

    #[test]
    fn test_apply_ranged_change() {
        let mut document = TextDocument::new("class Foo {}\n", 0);
        let range = Range::new(Position::new(0, 6), Position::new(0, 9));
        document.apply(&[TextChange::replace(range, "Bar")]).unwrap();
        assert_eq!(document.content(), "class Bar {}\n");
        assert_eq!(document.version(), 1);
    }

    #[test]
    fn test_apply_sequential_changes_resolve_against_updated_text() {
        let mut document = TextDocument::new("ab\n", 0);
        let insert_at = |line, character| {
            Range::new(Position::new(line, character), Position::new(line, character))
        };
        document
            .apply(&[
                TextChange::replace(insert_at(0, 2), "c"),
                TextChange::replace(insert_at(0, 3), "d"),
            ])
            .unwrap();
        assert_eq!(document.content(), "abcd\n");
        assert_eq!(document.version(), 1);
    }

    #[test]
    fn test_apply_invalid_range_leaves_document_untouched() {
        let mut document = TextDocument::new("short", 0);
        let range = Range::new(Position::new(5, 0), Position::new(5, 1));
        let err = document
            .apply(&[TextChange::replace(range, "x")])
            .unwrap_err();
        assert!(matches!(err, EditError::InvalidRange));
        assert_eq!(document.content(), "short");
        assert_eq!(document.version(), 0);
    }
}
