//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::types::*;

/// Storage abstraction over the host ledger's move lines
///
/// This trait allows the editor to work with any ledger backend
/// (an ERP database, a remote API, in-memory, etc.) by implementing these methods.
#[async_trait]
pub trait MoveLineStorage: Send + Sync {
    /// Save an existing line as-is (insert or replace)
    async fn save_line(&mut self, line: &MoveLine) -> EditResult<()>;

    /// Get a line by ID
    async fn get_line(&self, line_id: &str) -> EditResult<Option<MoveLine>>;

    /// Get the lines with the given IDs, in the given order, skipping unknown IDs
    async fn search_lines(&self, line_ids: &[String]) -> EditResult<Vec<MoveLine>>;

    /// List all lines of a journal entry
    async fn list_move_lines(&self, move_id: &str) -> EditResult<Vec<MoveLine>>;

    /// Create a new line.
    ///
    /// When `check_move_validity` is set the write is rejected if it leaves
    /// the owning entry unbalanced.
    async fn create_line(
        &mut self,
        values: &MoveLineValues,
        check_move_validity: bool,
    ) -> EditResult<MoveLine>;

    /// Update an existing line
    async fn update_line(&mut self, line: &MoveLine) -> EditResult<()>;

    /// Delete lines. Posted lines are refused unless `force` is set.
    async fn unlink_lines(&mut self, line_ids: &[String], force: bool) -> EditResult<()>;
}

/// Explicit transaction boundary around a mutating operation
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Open the unit of work
    async fn begin(&mut self) -> EditResult<()>;

    /// Make every write since `begin` permanent
    async fn commit(&mut self) -> EditResult<()>;

    /// Discard every write since `begin`
    async fn rollback(&mut self) -> EditResult<()>;
}

/// Trait for implementing the rules a selection must satisfy before editing
pub trait CompatibilityValidator: Send + Sync {
    /// Validate that the lines can be split or merged together
    fn validate_lines(&self, lines: &[MoveLine]) -> EditResult<()>;
}

/// Default validator: same entry, same account, nothing reconciled
pub struct DefaultCompatibilityValidator;

impl CompatibilityValidator for DefaultCompatibilityValidator {
    fn validate_lines(&self, lines: &[MoveLine]) -> EditResult<()> {
        let Some(first) = lines.first() else {
            return Ok(());
        };

        for line in lines {
            if line.move_id != first.move_id {
                return Err(EditError::CrossMoveSelection {
                    line_id: line.id.clone(),
                    expected: first.move_id.clone(),
                    found: line.move_id.clone(),
                });
            }
            if line.account_id != first.account_id {
                return Err(EditError::CrossAccountSelection {
                    line_id: line.id.clone(),
                    expected: first.account_id.clone(),
                    found: line.account_id.clone(),
                });
            }
            if line.reconciled {
                return Err(EditError::ReconciledLineSelected(line.id.clone()));
            }
        }

        Ok(())
    }
}
