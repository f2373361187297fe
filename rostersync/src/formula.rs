//! Per-row formula templates
//!
//! Formula columns hold a template such as `=SUM(D{row}:F{row})`. On every
//! write the template is rendered for the row the record lands on, so the
//! formula always refers to its own row.

use crate::address::ColumnId;

/// Render a formula template for the given output row and column.
///
/// `{row}` becomes the 1-based row number, `{col}` the column letters, and
/// `{{` / `}}` produce literal braces. Any other brace sequence is copied
/// unchanged.
pub fn render_template(template: &str, row: u32, col: ColumnId) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with("{row}") {
            out.push_str(&row.to_string());
            rest = &tail[5..];
        } else if tail.starts_with("{col}") {
            out.push_str(&col.letters());
            rest = &tail[5..];
        } else {
            out.push_str(&tail[..1]);
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(s: &str) -> ColumnId {
        s.parse().unwrap()
    }

    #[test]
    fn test_row_placeholder() {
        assert_eq!(
            render_template("=SUM(D{row}:F{row})", 8, col("G")),
            "=SUM(D8:F8)"
        );
    }

    #[test]
    fn test_col_placeholder() {
        assert_eq!(
            render_template("=COUNTA({col}$5:{col}{row})", 12, col("AB")),
            "=COUNTA(AB$5:AB12)"
        );
    }

    #[test]
    fn test_escaped_and_unknown_braces() {
        assert_eq!(render_template("={{1}}+{row}", 3, col("A")), "={1}+3");
        assert_eq!(render_template("=SUM({1,2})", 3, col("A")), "=SUM({1,2})");
        assert_eq!(render_template("=A1}", 3, col("A")), "=A1}");
    }

    #[test]
    fn test_plain_template() {
        assert_eq!(render_template("=TODAY()", 9, col("C")), "=TODAY()");
    }
}
