//! The tab-indented menu description.
//!
//! One item per line. Leading tabs encode nesting depth; the remaining
//! tab-separated fields are, by count: label only (doubles as output),
//! label and output, or icon path, label and output. An `IMG:` prefix on
//! the icon path is stripped. Empty fields are skipped, so a line of
//! only tabs is a no-op.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("too many fields: {0:?}")]
    TooManyFields(String),
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLine {
    pub depth: usize,
    pub icon: Option<String>,
    pub label: String,
    pub output: String,
}

/// Parse a single line; `Ok(None)` for a blank line.
pub fn parse_line(line: &str) -> Result<Option<MenuLine>, ParseError> {
    let trimmed = line.trim_start_matches('\t');
    let depth = line.len() - trimmed.len();

    let fields: Vec<&str> = trimmed.split('\t').filter(|f| !f.is_empty()).collect();
    let (icon, label, output) = match fields.as_slice() {
        [] => return Ok(None),
        [label] => (None, *label, *label),
        [label, output] => (None, *label, *output),
        [icon, label, output] => {
            let icon = icon.strip_prefix("IMG:").unwrap_or(icon);
            (Some(icon.to_string()), *label, *output)
        }
        _ => return Err(ParseError::TooManyFields(trimmed.to_string())),
    };

    Ok(Some(MenuLine {
        depth,
        icon,
        label: label.to_string(),
        output: output.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_doubles_as_output() {
        let line = parse_line("Open").unwrap().unwrap();
        assert_eq!(line.depth, 0);
        assert_eq!(line.label, "Open");
        assert_eq!(line.output, "Open");
        assert_eq!(line.icon, None);
    }

    #[test]
    fn test_label_and_output() {
        let line = parse_line("\t\tCut\tcut-cmd").unwrap().unwrap();
        assert_eq!(line.depth, 2);
        assert_eq!(line.label, "Cut");
        assert_eq!(line.output, "cut-cmd");
    }

    #[test]
    fn test_icon_prefix_stripped() {
        let line = parse_line("IMG:/tmp/x.png\tOpen\topen").unwrap().unwrap();
        assert_eq!(line.icon.as_deref(), Some("/tmp/x.png"));

        let line = parse_line("/tmp/y.png\tOpen\topen").unwrap().unwrap();
        assert_eq!(line.icon.as_deref(), Some("/tmp/y.png"));
    }

    #[test]
    fn test_blank_line_is_noop() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("\t\t").unwrap(), None);
    }

    #[test]
    fn test_empty_fields_are_skipped() {
        let line = parse_line("a\t\tb").unwrap().unwrap();
        assert_eq!(line.label, "a");
        assert_eq!(line.output, "b");
    }

    #[test]
    fn test_too_many_fields() {
        let err = parse_line("a\tb\tc\td").unwrap_err();
        assert!(matches!(err, ParseError::TooManyFields(_)));
    }
}
