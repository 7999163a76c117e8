//! Program naming and block name validation.

use crate::error::{EditorError, EditorResult};

/// Longest block name accepted by `DefaultNaming`.
pub const MAX_BLOCK_NAME_LEN: usize = 64;

/// Characters stripped from user-entered names and text parameters.
const INVALID_CHARACTERS: &[char] = &['<', '>', '&', '"', '\'', '`', '\\', '/', '|', ';'];

/// Naming collaborator used by the editor.
pub trait Naming {
    /// Name for a program that has none yet.
    fn default_program_name(&self) -> String;

    /// Check a proposed block name, returning the name to store.
    fn validate_block_name(&self, name: &str) -> EditorResult<String>;
}

/// Date-time program names and character-filtered block names.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNaming;

impl Naming for DefaultNaming {
    fn default_program_name(&self) -> String {
        date_time_name("program_", chrono::Local::now().naive_local())
    }

    fn validate_block_name(&self, name: &str) -> EditorResult<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(EditorError::InvalidName {
                reason: "name is empty".to_string(),
            });
        }
        if let Some(c) = trimmed.chars().find(|c| is_invalid(*c)) {
            return Err(EditorError::InvalidName {
                reason: format!("name contains {c:?}"),
            });
        }
        if trimmed.chars().count() > MAX_BLOCK_NAME_LEN {
            return Err(EditorError::InvalidName {
                reason: format!("name is longer than {MAX_BLOCK_NAME_LEN} characters"),
            });
        }
        Ok(trimmed.to_string())
    }
}

/// `prefix` followed by `YYYYMMDD_HHMMSS`.
pub fn date_time_name(prefix: &str, at: chrono::NaiveDateTime) -> String {
    format!("{prefix}{}", at.format("%Y%m%d_%H%M%S"))
}

/// Remove characters that are not allowed in names and text parameters.
pub fn filter_invalid_characters(text: &str) -> String {
    text.chars().filter(|c| !is_invalid(*c)).collect()
}

fn is_invalid(c: char) -> bool {
    c.is_control() || INVALID_CHARACTERS.contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn date_time_program_name() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap();
        assert_eq!(date_time_name("program_", at), "program_20240301_090507");
        assert!(DefaultNaming.default_program_name().starts_with("program_"));
    }

    #[test]
    fn block_names_are_trimmed_and_checked() {
        assert_eq!(
            DefaultNaming.validate_block_name("  heater ").unwrap(),
            "heater"
        );
        assert!(DefaultNaming.validate_block_name("   ").is_err());
        assert!(DefaultNaming.validate_block_name("a<b").is_err());
        assert!(DefaultNaming
            .validate_block_name(&"x".repeat(MAX_BLOCK_NAME_LEN + 1))
            .is_err());
    }

    #[test]
    fn filter_strips_markup() {
        assert_eq!(filter_invalid_characters("<b>temp</b>\n"), "btempb");
        assert_eq!(filter_invalid_characters("soil 1"), "soil 1");
    }
}
