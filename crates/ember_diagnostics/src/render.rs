//! Plain-text rendering in the `file:line:col: severity: message` shape.

use crate::diagnostic::Diagnostic;

/// Renders one diagnostic on a single line.
pub fn render(diag: &Diagnostic) -> String {
    match diag.location {
        Some(loc) => format!(
            "{}:{}:{}: {}: {}",
            diag.file.display(),
            loc.line,
            loc.column,
            diag.severity,
            diag.message
        ),
        None => format!("{}: {}: {}", diag.file.display(), diag.severity, diag.message),
    }
}

/// Renders diagnostics one per line.
pub fn render_all(diags: &[Diagnostic]) -> String {
    let mut out = String::new();
    for diag in diags {
        out.push_str(&render(diag));
        out.push('\n');
    }
    out
}
