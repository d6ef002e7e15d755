//! Layout of the MW100 answer to `FD0,09,09`.
//!
//! The answer is newline separated. The measurement sits on a fixed line, in a field
//! tagged with `W`; the value is whatever follows the tag up to the end of that field.

use super::mw100::{Mw100Error, Result};

/// 0-based index of the line carrying the measurement.
pub const MEASUREMENT_LINE: usize = 3;

/// Tag preceding the value on the measurement line.
pub const VALUE_DELIMITER: char = 'W';

/// Pulls the trimmed value out of a raw response.
///
/// The value ends at the next `,` or `W`, or at the end of the line. A value that itself
/// contains commas is cut off at its first comma: `W1,234` yields `1`.
pub fn extract_value(response: &str) -> Result<String> {
    let lines: Vec<&str> = response.split('\n').collect();
    let line = lines.get(MEASUREMENT_LINE).ok_or(Mw100Error::MissingLine {
        expected: MEASUREMENT_LINE,
        found: lines.len(),
    })?;

    let (_, after_tag) = line
        .split_once(VALUE_DELIMITER)
        .ok_or_else(|| Mw100Error::MissingDelimiter {
            line: line.to_string(),
        })?;

    let field = after_tag
        .split(|c: char| c == ',' || c == VALUE_DELIMITER)
        .next()
        .unwrap_or(after_tag);

    Ok(field.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn value_follows_tag_on_fourth_line() {
        let value = extract_value("L1\nL2\nL3\nSTAT,09W1234.5,09\n").unwrap();
        assert_eq!(value, "1234.5");
    }

    #[test]
    fn comma_cuts_the_value() {
        assert_eq!(extract_value("a\nb\nc\nN 009 W 1,234.5\n").unwrap(), "1");
        assert_eq!(extract_value("a\nb\nc\nW 12 ,W 13\n").unwrap(), "12");
    }

    #[test]
    fn value_without_trailing_field_runs_to_end_of_line() {
        let value = extract_value("A\r\nB\r\nC\r\nN 009 W    +0012.34E+00\r\nEN\r\n").unwrap();
        assert_eq!(value, "+0012.34E+00");
    }

    #[test]
    fn only_first_tag_counts() {
        assert_eq!(extract_value("a\nb\nc\nxW 5 W 6\n").unwrap(), "5");
        assert_eq!(extract_value("a\nb\nc\nW\n").unwrap(), "");
    }

    #[test]
    fn other_lines_are_ignored() {
        let value = extract_value("W1\nW2\nW3\nW4\nW5").unwrap();
        assert_eq!(value, "4");
    }

    #[test]
    fn too_few_lines() {
        let err = extract_value("L1\nL2\nL3").unwrap_err();
        assert!(matches!(err, Mw100Error::MissingLine { expected: 3, found: 3 }));

        let err = extract_value("").unwrap_err();
        assert!(matches!(err, Mw100Error::MissingLine { found: 1, .. }));
    }

    #[test]
    fn measurement_line_without_tag() {
        let err = extract_value("L1\nL2\nL3\nSTAT,09,1234.5\n").unwrap_err();
        match err {
            Mw100Error::MissingDelimiter { line } => assert_eq!(line, "STAT,09,1234.5"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
