//! Diagnostic collection.

use std::fmt;

use hlslc_ir::{NamePool, SourceLoc};

/// Severity of a diagnostic line.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Level {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Note => "note",
        })
    }
}

/// Overall compilation status. Transitions are monotonic:
/// ok → warning → error, never downgraded.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum Status {
    Ok,
    Warning,
    Error,
}

/// Collects diagnostic lines into a single growable buffer.
///
/// Each line has the form `<file>:<line>:<col>: <level>: <message>`.
#[derive(Clone, Debug)]
pub struct DiagnosticSink {
    buffer: String,
    status: Status,
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            status: Status::Ok,
        }
    }

    /// Appends one diagnostic line and raises the status if needed.
    /// Notes never affect the status.
    pub fn report(
        &mut self,
        files: &NamePool,
        loc: SourceLoc,
        level: Level,
        message: &str,
    ) {
        use std::fmt::Write;
        let file = files.get(loc.file).unwrap_or("<unknown>");
        let _ = writeln!(
            self.buffer,
            "{}:{}:{}: {}: {}",
            file, loc.line, loc.col, level, message
        );
        let raised = match level {
            Level::Error => Status::Error,
            Level::Warning => Status::Warning,
            Level::Note => Status::Ok,
        };
        self.status = self.status.max(raised);
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn has_errors(&self) -> bool {
        self.status == Status::Error
    }

    /// The accumulated diagnostic text.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Consumes the sink, returning the diagnostic text.
    pub fn into_buffer(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (NamePool, SourceLoc) {
        let mut files = NamePool::new();
        let f = files.intern("shader.fx");
        let loc = SourceLoc::new(f, 12, 5);
        (files, loc)
    }

    #[test]
    fn line_format() {
        let (files, loc) = setup();
        let mut sink = DiagnosticSink::new();
        sink.report(&files, loc, Level::Error, "redefinition of 'x'");
        assert_eq!(sink.buffer(), "shader.fx:12:5: error: redefinition of 'x'\n");
    }

    #[test]
    fn status_is_monotonic() {
        let (files, loc) = setup();
        let mut sink = DiagnosticSink::new();
        assert_eq!(sink.status(), Status::Ok);

        sink.report(&files, loc, Level::Warning, "implicit truncation");
        assert_eq!(sink.status(), Status::Warning);

        sink.report(&files, loc, Level::Error, "bad cast");
        assert_eq!(sink.status(), Status::Error);

        // A later warning must not downgrade the status.
        sink.report(&files, loc, Level::Warning, "another");
        assert_eq!(sink.status(), Status::Error);
        assert!(sink.has_errors());
    }

    #[test]
    fn notes_do_not_change_status() {
        let (files, loc) = setup();
        let mut sink = DiagnosticSink::new();
        sink.report(&files, loc, Level::Note, "previous declaration here");
        assert_eq!(sink.status(), Status::Ok);
    }
}
