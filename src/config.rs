//! Editor configuration

use serde::{Deserialize, Serialize};
use std::env;

use crate::types::*;

/// Settings shared by every split and merge run by an editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// Division count a new split session starts with
    pub default_division_count: u32,
    /// Upper bound on the number of installments
    pub max_division_count: u32,
    /// Create replacement lines without checking the entry balance after each write
    pub defer_move_validity: bool,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            default_division_count: 2,
            max_division_count: 120,
            defer_move_validity: true,
        }
    }
}

impl EditConfig {
    /// Load from `MOVE_LINE_EDIT_*` environment variables, falling back to defaults
    pub fn from_env() -> EditResult<Self> {
        let defaults = Self::default();
        let config = Self {
            default_division_count: parse_var(
                "MOVE_LINE_EDIT_DEFAULT_DIVISIONS",
                defaults.default_division_count,
            )?,
            max_division_count: parse_var(
                "MOVE_LINE_EDIT_MAX_DIVISIONS",
                defaults.max_division_count,
            )?,
            defer_move_validity: defaults.defer_move_validity,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the settings are consistent
    pub fn validate(&self) -> EditResult<()> {
        if self.default_division_count < 2 {
            return Err(EditError::Config(format!(
                "default division count must be at least 2, got {}",
                self.default_division_count
            )));
        }
        if self.default_division_count > self.max_division_count {
            return Err(EditError::Config(format!(
                "default division count {} exceeds the maximum of {}",
                self.default_division_count, self.max_division_count
            )));
        }
        Ok(())
    }
}

fn parse_var(name: &str, default: u32) -> EditResult<u32> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| EditError::Config(format!("{name} must be a positive integer, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}
