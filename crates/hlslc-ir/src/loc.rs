//! Source locations and the file-name pool.

use crate::arena::Handle;

/// A source file name, as spelled by a `#line` directive (or the
/// compilation's initial input name).
pub type FileName = String;

/// The deduplicated pool of file names a compilation's locations refer
/// to.
///
/// `#line` directives repeat the same file arbitrarily often; each name
/// is stored once and handed out by handle, so a [`SourceLoc`] stays
/// `Copy`. Interning scans linearly: a compilation sees a handful of
/// files at most.
#[derive(Clone, Debug, Default)]
pub struct NamePool {
    names: Vec<FileName>,
}

impl NamePool {
    pub fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Returns the number of distinct file names seen so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no file name has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Interns a file name, returning the existing handle when the name
    /// has been seen before.
    pub fn intern(&mut self, name: &str) -> Handle<FileName> {
        if let Some(position) = self.names.iter().position(|n| n == name) {
            return Handle::new(position as u32);
        }
        let handle = Handle::new(self.names.len() as u32);
        self.names.push(name.to_string());
        handle
    }

    /// The name behind a handle, if the handle belongs to this pool.
    pub fn get(&self, handle: Handle<FileName>) -> Option<&str> {
        self.names.get(handle.index()).map(String::as_str)
    }
}

/// An immutable source position: interned file name, 1-based line and column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceLoc {
    pub file: Handle<FileName>,
    pub line: u32,
    pub col: u32,
}

impl SourceLoc {
    pub fn new(file: Handle<FileName>, line: u32, col: u32) -> Self {
        Self { file, line, col }
    }
}

/// The extent of a token: its starting [`SourceLoc`] plus the line and
/// column one past its last character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenSpan {
    pub start: SourceLoc,
    pub end_line: u32,
    pub end_col: u32,
}

impl TokenSpan {
    pub fn new(start: SourceLoc, end_line: u32, end_col: u32) -> Self {
        Self {
            start,
            end_line,
            end_col,
        }
    }

    /// A zero-width span at `start`.
    pub fn empty(start: SourceLoc) -> Self {
        Self {
            start,
            end_line: start.line,
            end_col: start.col,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates_names() {
        let mut files = NamePool::new();
        let shader = files.intern("shader.fx");
        let header = files.intern("common.fxh");
        let again = files.intern("shader.fx");
        assert_eq!(shader, again);
        assert_ne!(shader, header);
        assert_eq!(files.len(), 2);
        assert_eq!(files.get(shader), Some("shader.fx"));
        assert_eq!(files.get(header), Some("common.fxh"));
    }

    #[test]
    fn loc_carries_interned_file() {
        let mut files = NamePool::new();
        let f = files.intern("shader.fx");
        let loc = SourceLoc::new(f, 3, 14);
        assert_eq!(files.get(loc.file), Some("shader.fx"));
        assert_eq!(loc.line, 3);
        assert_eq!(loc.col, 14);
    }

    #[test]
    fn empty_span_is_zero_width() {
        let mut files = NamePool::new();
        let f = files.intern("a.fx");
        let span = TokenSpan::empty(SourceLoc::new(f, 7, 1));
        assert_eq!(span.end_line, 7);
        assert_eq!(span.end_col, 1);
    }
}
