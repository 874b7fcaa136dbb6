//! Centralized directory-name parsing for the `NN_name` convention.
//!
//! Chapters and lessons are both directories named with a numeric prefix,
//! an underscore, and a name: `01_intro`, `02_control_flow`. The prefix
//! decides the order, the rest becomes the display name.
//!
//! ## Display Names
//!
//! Underscores in the name portion are rendered as spaces:
//! - `01_intro` → "intro"
//! - `02_control_flow` → "control flow"
//! - `10_hello_world` → "hello world"
//!
//! Parsing is strict. A name without the separator, with a non-numeric
//! prefix, or with nothing after the separator is rejected so a typo in a
//! directory name fails the build instead of silently moving a lesson.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("expected `<digits>_<name>`, found no `_` separator")]
    MissingSeparator,
    #[error("prefix `{0}` is not a number")]
    NonNumericPrefix(String),
    #[error("nothing follows the numeric prefix")]
    EmptyName,
}

/// Result of parsing an entry name like `02_control_flow`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix (`2` from `02_control_flow`).
    pub number: u32,
    /// Raw name after the first `_`, underscores preserved.
    pub name: String,
    /// Display name: underscores converted to spaces.
    pub display_title: String,
}

impl ParsedName {
    /// URL segment for this entry: the display name with spaces as hyphens.
    pub fn slug_segment(&self) -> String {
        slug_segment(&self.display_title)
    }
}

/// Parse an entry name following the `NN_name` convention.
///
/// - `"01_intro"` → number=1, name="intro", display_title="intro"
/// - `"02_control_flow"` → number=2, name="control_flow", display_title="control flow"
/// - `"intro"` → `MissingSeparator`
/// - `"a1_intro"` → `NonNumericPrefix`
/// - `"03_"` → `EmptyName`
pub fn parse_entry_name(name: &str) -> Result<ParsedName, NameError> {
    let (prefix, rest) = name.split_once('_').ok_or(NameError::MissingSeparator)?;
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
        return Err(NameError::NonNumericPrefix(prefix.to_string()));
    }
    let number = prefix
        .parse::<u32>()
        .map_err(|_| NameError::NonNumericPrefix(prefix.to_string()))?;
    if rest.is_empty() {
        return Err(NameError::EmptyName);
    }
    Ok(ParsedName {
        number,
        name: rest.to_string(),
        display_title: rest.replace('_', " "),
    })
}

/// Spaces become hyphens; everything else is kept verbatim.
pub fn slug_segment(display: &str) -> String {
    display.replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_single_word() {
        let p = parse_entry_name("01_intro").unwrap();
        assert_eq!(p.number, 1);
        assert_eq!(p.name, "intro");
        assert_eq!(p.display_title, "intro");
    }

    #[test]
    fn underscores_become_spaces() {
        let p = parse_entry_name("02_control_flow").unwrap();
        assert_eq!(p.number, 2);
        assert_eq!(p.name, "control_flow");
        assert_eq!(p.display_title, "control flow");
        assert_eq!(p.slug_segment(), "control-flow");
    }

    #[test]
    fn large_and_zero_prefixes() {
        assert_eq!(parse_entry_name("999_last").unwrap().number, 999);
        assert_eq!(parse_entry_name("000_first").unwrap().number, 0);
    }

    #[test]
    fn missing_separator_is_error() {
        assert_eq!(parse_entry_name("intro"), Err(NameError::MissingSeparator));
    }

    #[test]
    fn non_numeric_prefix_is_error() {
        assert_eq!(
            parse_entry_name("a1_intro"),
            Err(NameError::NonNumericPrefix("a1".to_string()))
        );
        assert_eq!(
            parse_entry_name("_intro"),
            Err(NameError::NonNumericPrefix(String::new()))
        );
        assert!(matches!(
            parse_entry_name("+1_intro"),
            Err(NameError::NonNumericPrefix(_))
        ));
    }

    #[test]
    fn empty_name_is_error() {
        assert_eq!(parse_entry_name("03_"), Err(NameError::EmptyName));
    }

    #[test]
    fn hyphens_in_name_are_kept() {
        let p = parse_entry_name("04_try-catch").unwrap();
        assert_eq!(p.display_title, "try-catch");
        assert_eq!(p.slug_segment(), "try-catch");
    }
}
