//! Main editor orchestrating split and merge sessions

use tracing::warn;

use crate::config::EditConfig;
use crate::editor::{Combiner, Divisor};
use crate::traits::*;
use crate::types::*;

/// Move line editor that owns the storage backend and runs edit sessions
pub struct MoveLineEditor<S: MoveLineStorage + UnitOfWork> {
    storage: S,
    validator: Box<dyn CompatibilityValidator>,
    config: EditConfig,
}

impl<S: MoveLineStorage + UnitOfWork> MoveLineEditor<S> {
    /// Create a new editor with the given storage backend
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultCompatibilityValidator),
            config: EditConfig::default(),
        }
    }

    /// Create a new editor with a custom compatibility validator
    pub fn with_validator(storage: S, validator: Box<dyn CompatibilityValidator>) -> Self {
        Self {
            storage,
            validator,
            config: EditConfig::default(),
        }
    }

    /// Replace the configuration, rejecting inconsistent settings
    pub fn with_config(mut self, config: EditConfig) -> EditResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    /// Access the storage backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    // Entry actions
    /// Open a split session on the selected lines
    pub fn action_split_move_lines(&self, line_ids: Vec<String>) -> MoveLineEditSession {
        MoveLineEditSession::new(
            SessionKind::Split,
            line_ids,
            self.config.default_division_count,
        )
    }

    /// Open a merge session on the selected lines
    pub fn action_merge_move_lines(&self, line_ids: Vec<String>) -> MoveLineEditSession {
        MoveLineEditSession::new(
            SessionKind::Merge,
            line_ids,
            self.config.default_division_count,
        )
    }

    // Split operations
    /// Generate (or regenerate) the session's installments
    pub async fn generate_divisions<'s>(
        &self,
        session: &'s mut MoveLineEditSession,
    ) -> EditResult<&'s [DivisionLine]> {
        session.expect_kind(SessionKind::Split)?;
        Divisor::new(&self.config, self.validator.as_ref())
            .generate_divisions(&self.storage, &mut session.request, &session.active_ids)
            .await?;
        Ok(&session.request.division_lines)
    }

    /// Replace the source line with the session's installments
    pub async fn apply_split(
        &mut self,
        session: &MoveLineEditSession,
    ) -> EditResult<Vec<MoveLine>> {
        session.expect_kind(SessionKind::Split)?;
        self.storage.begin().await?;
        let result = Divisor::new(&self.config, self.validator.as_ref())
            .apply_split(&mut self.storage, &session.request)
            .await;
        self.finish(result).await
    }

    // Merge operations
    /// Merge the session's lines into one line due on the aggregation date
    pub async fn merge_lines(&mut self, session: &MoveLineEditSession) -> EditResult<MoveLine> {
        session.expect_kind(SessionKind::Merge)?;
        self.storage.begin().await?;
        let result = Combiner::new(&self.config, self.validator.as_ref())
            .merge_lines(
                &mut self.storage,
                &session.active_ids,
                session.request.aggregation_date,
            )
            .await;
        self.finish(result).await
    }

    /// Commit on success, roll back on failure
    async fn finish<T>(&mut self, result: EditResult<T>) -> EditResult<T> {
        match result {
            Ok(value) => {
                self.storage.commit().await?;
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "move line edit failed, rolling back");
                if let Err(rollback_err) = self.storage.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MemoryStorage;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_editor_split_and_merge_back() {
        let mut storage = MemoryStorage::new();
        let mut receivable = MoveLine::new("rec".into(), "inv1".into(), "receivable".into(), "sales".into())
            .with_debit(BigDecimal::from(300));
        receivable.date_maturity = Some(ymd(2024, 1, 31));
        let revenue = MoveLine::new("rev".into(), "inv1".into(), "revenue".into(), "sales".into())
            .with_credit(BigDecimal::from(300));
        storage.save_line(&receivable).await.unwrap();
        storage.save_line(&revenue).await.unwrap();

        let mut editor = MoveLineEditor::new(storage);
        let mut session = editor.action_split_move_lines(vec!["rec".to_string()]);
        assert_eq!(session.request.division_count, 2);
        session.request.division_count = 3;

        let divisions = editor.generate_divisions(&mut session).await.unwrap();
        assert_eq!(divisions.len(), 3);

        let created = editor.apply_split(&session).await.unwrap();
        assert_eq!(created.len(), 3);
        assert_eq!(
            editor.storage().move_balance("inv1").unwrap(),
            BigDecimal::from(0)
        );

        let ids: Vec<String> = created.iter().map(|l| l.id.clone()).collect();
        let mut merge = editor.action_merge_move_lines(ids);
        merge.request.aggregation_date = Some(ymd(2024, 6, 30));
        let merged = editor.merge_lines(&merge).await.unwrap();

        assert_eq!(merged.debit, BigDecimal::from(300));
        assert_eq!(merged.date_maturity, Some(ymd(2024, 6, 30)));
        assert_eq!(editor.storage().list_move_lines("inv1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_session_kind_is_enforced() {
        let mut editor = MoveLineEditor::new(MemoryStorage::new());
        let mut merge = editor.action_merge_move_lines(vec!["a".into(), "b".into()]);
        assert!(matches!(
            editor.generate_divisions(&mut merge).await,
            Err(EditError::WrongSessionKind(SessionKind::Merge))
        ));

        let split = editor.action_split_move_lines(vec!["a".into()]);
        assert!(matches!(
            editor.merge_lines(&split).await,
            Err(EditError::WrongSessionKind(SessionKind::Split))
        ));
    }

    #[tokio::test]
    async fn test_failed_operation_closes_unit_of_work() {
        let mut editor = MoveLineEditor::new(MemoryStorage::new());
        let split = editor.action_split_move_lines(vec!["a".into()]);
        assert!(matches!(
            editor.apply_split(&split).await,
            Err(EditError::DivisionsNotGenerated)
        ));

        // A second operation can open its own unit of work
        assert!(editor.storage_mut().begin().await.is_ok());
        assert!(editor.storage_mut().commit().await.is_ok());
    }

    #[test]
    fn test_with_config_rejects_invalid_settings() {
        let editor = MoveLineEditor::new(MemoryStorage::new());
        let config = EditConfig {
            default_division_count: 0,
            ..EditConfig::default()
        };
        assert!(editor.with_config(config).is_err());
    }
}
