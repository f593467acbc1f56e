//! Parsing of clang-style compiler output.
//!
//! Lines of the form `path:line:col: severity: message` become diagnostics.
//! Continuation lines (source excerpts, carets, include traces) are skipped.

use std::path::Path;

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Parses compiler output into diagnostics attributed to `unit`.
///
/// The compiler reports positions against the file it was handed, which for
/// the live engine is the cached snapshot, so every diagnostic is attributed
/// to the unit's authoritative path instead. Positions inside other files
/// (headers) keep their own file path only in the message.
pub fn parse_compiler_output(output: &str, unit: &Path, compiled: &Path) -> Vec<Diagnostic> {
    output
        .lines()
        .filter_map(|line| parse_line(line, unit, compiled))
        .collect()
}

fn parse_line(line: &str, unit: &Path, compiled: &Path) -> Option<Diagnostic> {
    // Split from the right side of the location: "<path>:<line>:<col>: <rest>".
    let (location, rest) = split_location(line)?;
    let (label, message) = rest.split_once(": ")?;
    let severity = Severity::from_label(label)?;

    let (path, line_no, column) = location;
    let same_file = Path::new(path) == compiled || Path::new(path) == unit;
    let message = if same_file {
        message.trim().to_string()
    } else {
        format!("{path}:{line_no}:{column}: {}", message.trim())
    };

    let diag = Diagnostic::new(severity, unit, message);
    Some(if same_file {
        diag.at(line_no, column)
    } else {
        diag
    })
}

fn split_location(line: &str) -> Option<((&str, u32, u32), &str)> {
    // Paths may contain ':' (drive letters), so locate the ": " that ends the
    // position and then walk back over the two numeric fields.
    let mut search_from = 0;
    while let Some(offset) = line[search_from..].find(": ") {
        let end = search_from + offset;
        let head = &line[..end];
        let mut parts = head.rsplitn(3, ':');
        let column = parts.next().and_then(|c| c.parse::<u32>().ok());
        let line_no = parts.next().and_then(|l| l.parse::<u32>().ok());
        let path = parts.next();
        if let (Some(column), Some(line_no), Some(path)) = (column, line_no, path) {
            if !path.is_empty() {
                return Some(((path, line_no, column), &line[end + 2..]));
            }
        }
        search_from = end + 2;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: &str = "/project/src/a.cpp";
    const CACHED: &str = "/project/.cache/a.cpp";

    #[test]
    fn parses_error_in_compiled_file() {
        let out = "/project/.cache/a.cpp:1:5: error: expected unqualified-id\nint void(){return 0;}\n    ^\n1 error generated.\n";
        let diags = parse_compiler_output(out, Path::new(UNIT), Path::new(CACHED));
        assert_eq!(diags.len(), 1);
        let d = &diags[0];
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.file, Path::new(UNIT));
        assert_eq!(d.message, "expected unqualified-id");
        assert_eq!(d.location.map(|l| (l.line, l.column)), Some((1, 5)));
    }

    #[test]
    fn header_positions_stay_in_message() {
        let out = "/usr/include/x.h:10:2: warning: deprecated thing\n";
        let diags = parse_compiler_output(out, Path::new(UNIT), Path::new(CACHED));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].file, Path::new(UNIT));
        assert!(diags[0].location.is_none());
        assert!(diags[0].message.starts_with("/usr/include/x.h:10:2:"));
    }

    #[test]
    fn fatal_error_label() {
        let out = "/project/.cache/a.cpp:2:10: fatal error: 'missing.h' file not found\n";
        let diags = parse_compiler_output(out, Path::new(UNIT), Path::new(CACHED));
        assert_eq!(diags[0].severity, Severity::Fatal);
        assert!(diags[0].is_error());
    }

    #[test]
    fn windows_drive_letter_path() {
        let out = "C:\\work\\a.cpp:3:1: error: oops\n";
        let diags = parse_compiler_output(out, Path::new(UNIT), Path::new(CACHED));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "C:\\work\\a.cpp:3:1: oops");
    }

    #[test]
    fn ignores_noise() {
        let out = "In file included from /project/src/a.cpp:1:\n    ^~~~\n2 errors generated.\n";
        assert!(parse_compiler_output(out, Path::new(UNIT), Path::new(CACHED)).is_empty());
    }
}
