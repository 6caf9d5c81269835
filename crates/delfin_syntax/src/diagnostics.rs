//! Diagnostics for the Delphi analysis frontend.
//!
//! Every stage (preprocessor, parser, resolver, typing) accumulates [`Diagnostic`]s
//! instead of aborting; the host decides what is fatal. Diagnostics carry a byte-span
//! into the unit's source text; line/column is derived on demand for display.

use crate::ast::Span;

/// Severity of a diagnostic, as surfaced to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Hint,
}

/// The closed taxonomy of recoverable frontend errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Malformed token sequence; the parser recovered and continued.
    Syntax,
    /// A name reference did not resolve; it was bound to the unknown type.
    UnresolvedIdentifier,
    /// Two non-routine declarations share a name in one scope.
    DuplicateIdentifier,
    /// An include chain reached a file already being included.
    CircularInclude,
    /// An include directive's target could not be read.
    UnresolvableInclude,
    /// A conditional block was still open at end of input.
    UnterminatedConditional,
    /// Overload resolution found no viable candidate.
    NoMatchingOverload,
    /// Overload resolution found two or more equally ranked candidates.
    AmbiguousOverload,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::Syntax => write!(f, "syntax error"),
            DiagnosticKind::UnresolvedIdentifier => write!(f, "unresolved identifier"),
            DiagnosticKind::DuplicateIdentifier => write!(f, "duplicate identifier"),
            DiagnosticKind::CircularInclude => write!(f, "circular include"),
            DiagnosticKind::UnresolvableInclude => write!(f, "unresolvable include"),
            DiagnosticKind::UnterminatedConditional => write!(f, "unterminated conditional"),
            DiagnosticKind::NoMatchingOverload => write!(f, "no matching overload"),
            DiagnosticKind::AmbiguousOverload => write!(f, "ambiguous overload"),
        }
    }
}

/// A recoverable frontend finding with location information.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            span,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticKind::Syntax, message, span)
    }

    pub fn warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    /// Wrap this diagnostic in a [`miette::Report`] carrying the source text, for
    /// fancy rendering by hosts that want it.
    pub fn to_report(&self, file_name: &str, source: &str) -> miette::Report {
        let len = self.span.end.saturating_sub(self.span.start).max(1);
        miette::Report::new(RenderedDiagnostic {
            message: self.message.clone(),
            label: self.kind.to_string(),
            src: miette::NamedSource::new(file_name, source.to_string()),
            span: miette::SourceSpan::new(self.span.start.into(), len),
        })
    }
}

/// miette-renderable form of a [`Diagnostic`].
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("{message}")]
struct RenderedDiagnostic {
    message: String,
    label: String,
    #[source_code]
    src: miette::NamedSource<String>,
    #[label("{label}")]
    span: miette::SourceSpan,
}

/// Print a diagnostic with source context.
pub fn print_diagnostic(file_name: &str, source: &str, diagnostic: &Diagnostic) {
    let (line_num, col_num, line_text) = line_info(source, diagnostic.span.start);

    let red = "\x1b[31m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let bold = "\x1b[1m";
    let reset = "\x1b[0m";

    let color = match diagnostic.severity {
        Severity::Error => red,
        Severity::Warning | Severity::Hint => yellow,
    };

    eprintln!(
        "{bold}{color}{kind}{reset}{bold}: {message}{reset}",
        kind = diagnostic.kind,
        message = diagnostic.message,
    );
    eprintln!("  {cyan}-->{reset} {file_name}:{line_num}:{col_num}");

    let width = format!("{line_num}").len();
    eprintln!("  {cyan}{:>width$} |{reset}", "");
    eprintln!("  {cyan}{line_num:>width$} |{reset} {line_text}");

    let underline = diagnostic
        .span
        .end
        .saturating_sub(diagnostic.span.start)
        .min(line_text.len().saturating_sub(col_num - 1))
        .max(1);
    eprintln!(
        "  {cyan}{:>width$} |{reset} {}{color}{}{reset}",
        "",
        " ".repeat(col_num - 1),
        "^".repeat(underline),
    );
    eprintln!();
}

/// Get line number, column number, and line text for a byte offset.
pub fn line_info(source: &str, offset: usize) -> (usize, usize, &str) {
    let offset = offset.min(source.len());
    let mut line_num = 1;
    let mut line_start = 0;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line_num += 1;
            line_start = i + 1;
        }
    }

    let line_end = source[line_start..]
        .find('\n')
        .map(|i| line_start + i)
        .unwrap_or(source.len());

    (line_num, offset - line_start + 1, &source[line_start..line_end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_info() {
        let source = "unit U;\ninterface\nend.";

        let (line, col, text) = line_info(source, 0);
        assert_eq!((line, col, text), (1, 1, "unit U;"));

        let (line, col, text) = line_info(source, 8);
        assert_eq!((line, col, text), (2, 1, "interface"));

        let (line, col, text) = line_info(source, 12);
        assert_eq!((line, col, text), (2, 5, "interface"));
    }

    #[test]
    fn test_diagnostic_defaults_to_error() {
        let d = Diagnostic::syntax("unexpected token", Span::new(0, 1));
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.kind, DiagnosticKind::Syntax);
    }
}
