//! Validation utilities

use crate::config::EditConfig;
use crate::types::*;

/// Validate the requested number of installments
pub fn validate_division_count(division_count: u32, config: &EditConfig) -> EditResult<()> {
    if division_count <= 1 || division_count > config.max_division_count {
        return Err(EditError::InvalidDivisionCount(division_count));
    }
    Ok(())
}

/// Validate that exactly one line is selected for a split, returning its ID
pub fn validate_single_selection(line_ids: &[String]) -> EditResult<&str> {
    match line_ids {
        [] => Err(EditError::EmptySelection),
        [line_id] => Ok(line_id.as_str()),
        _ => Err(EditError::MultipleLinesForSplit(line_ids.len())),
    }
}

/// Validate that enough lines were found to merge
pub fn validate_merge_selection(lines: &[MoveLine]) -> EditResult<()> {
    match lines.len() {
        0 => Err(EditError::EmptySelection),
        1 => Err(EditError::SingleLineForMerge),
        _ => Ok(()),
    }
}

/// Validate that a line has a due date to stagger installments from
pub fn validate_maturity_date(line: &MoveLine) -> EditResult<chrono::NaiveDate> {
    line.date_maturity
        .ok_or_else(|| EditError::MissingMaturityDate {
            line_id: line.id.clone(),
            name: line.name.clone(),
        })
}
