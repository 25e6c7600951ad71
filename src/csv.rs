//! Minimal CSV helpers shared by the grid reader, the results reader and the
//! log/summary writers.
//!
//! The files involved are small, hand-edited spreadsheets exports, so a
//! line-based quote-aware splitter is all that is needed.

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
/// Returns owned strings because quoted fields need unquoting.
pub fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Quote a field if it contains a comma, quote or newline.
pub fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Join fields into one CSV line (no trailing newline).
pub fn csv_join<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| csv_escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Lines of a CSV document with `\r` and a leading byte-order mark removed.
pub fn csv_lines(text: &str) -> impl Iterator<Item = &str> {
    text.trim_start_matches('\u{feff}')
        .lines()
        .map(|l| l.trim_end_matches('\r'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain() {
        assert_eq!(csv_split("a,b,,c"), vec!["a", "b", "", "c"]);
    }

    #[test]
    fn test_split_quoted_comma_and_escape() {
        assert_eq!(
            csv_split(r#""Heat, crust","say ""hi""",3"#),
            vec!["Heat, crust", r#"say "hi""#, "3"]
        );
    }

    #[test]
    fn test_join_escapes_only_when_needed() {
        assert_eq!(
            csv_join(&["Index", "W/m³", "a,b", "q\"x"]),
            r#"Index,W/m³,"a,b","q""x""#
        );
    }

    #[test]
    fn test_join_then_split_preserves_fields() {
        let fields = ["Scatter plots", "x, y", "\"quoted\""];
        assert_eq!(csv_split(&csv_join(&fields)), fields);
    }

    #[test]
    fn test_lines_strip_bom_and_cr() {
        let lines: Vec<_> = csv_lines("\u{feff}a,b\r\n1,2\r\n").collect();
        assert_eq!(lines, vec!["a,b", "1,2"]);
    }
}
