//! Merging compatible move lines into one

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use tracing::info;

use crate::config::EditConfig;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation;

/// Combines lines of the same entry and account into a single line
pub struct Combiner<'a> {
    config: &'a EditConfig,
    validator: &'a dyn CompatibilityValidator,
}

impl<'a> Combiner<'a> {
    /// Create a combiner with the given settings and validator
    pub fn new(config: &'a EditConfig, validator: &'a dyn CompatibilityValidator) -> Self {
        Self { config, validator }
    }

    /// Merge the selected lines, due on `aggregation_date`, and delete them
    pub async fn merge_lines<S: MoveLineStorage>(
        &self,
        storage: &mut S,
        selected_ids: &[String],
        aggregation_date: Option<NaiveDate>,
    ) -> EditResult<MoveLine> {
        let lines = storage.search_lines(selected_ids).await?;
        validation::validate_merge_selection(&lines)?;
        self.validator.validate_lines(&lines)?;

        let (debit, credit) = lines.iter().fold(
            (BigDecimal::from(0), BigDecimal::from(0)),
            |(debit, credit), line| (debit + &line.debit, credit + &line.credit),
        );

        let first = lines.first().ok_or(EditError::EmptySelection)?;
        let values = MoveLineValues::from_source(first, debit, credit, aggregation_date);
        let merged = storage
            .create_line(&values, !self.config.defer_move_validity)
            .await?;

        let merged_ids: Vec<String> = lines.iter().map(|l| l.id.clone()).collect();
        storage.unlink_lines(&merged_ids, true).await?;

        info!(
            line_id = %merged.id,
            move_id = %merged.move_id,
            merged = merged_ids.len(),
            "merged move lines"
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MemoryStorage;

    fn debit_line(id: &str, amount: i64) -> MoveLine {
        MoveLine::new(id.into(), "m1".into(), "a1".into(), "j1".into())
            .with_debit(BigDecimal::from(amount))
    }

    #[tokio::test]
    async fn test_merge_sums_both_sides() {
        let mut storage = MemoryStorage::new();
        storage.save_line(&debit_line("l1", 50)).await.unwrap();
        storage.save_line(&debit_line("l2", 30)).await.unwrap();
        let mut credit = MoveLine::new("l3".into(), "m1".into(), "a1".into(), "j1".into())
            .with_credit(BigDecimal::from(5));
        credit.posted = true;
        storage.save_line(&credit).await.unwrap();

        let config = EditConfig::default();
        let combiner = Combiner::new(&config, &DefaultCompatibilityValidator);
        let ids = vec!["l1".to_string(), "l2".to_string(), "l3".to_string()];
        let merged = combiner.merge_lines(&mut storage, &ids, None).await.unwrap();

        assert_eq!(merged.debit, BigDecimal::from(80));
        assert_eq!(merged.credit, BigDecimal::from(5));
        assert_eq!(merged.balance, BigDecimal::from(75));
        assert_eq!(merged.date_maturity, None);
        assert_eq!(storage.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_merge_unknown_ids() {
        let mut storage = MemoryStorage::new();
        storage.save_line(&debit_line("l1", 50)).await.unwrap();
        let config = EditConfig::default();
        let combiner = Combiner::new(&config, &DefaultCompatibilityValidator);

        let result = combiner
            .merge_lines(&mut storage, &["x".to_string(), "y".to_string()], None)
            .await;
        assert!(matches!(result, Err(EditError::EmptySelection)));

        let result = combiner
            .merge_lines(&mut storage, &["l1".to_string(), "y".to_string()], None)
            .await;
        assert!(matches!(result, Err(EditError::SingleLineForMerge)));
    }
}
