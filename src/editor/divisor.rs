//! Splitting a move line into monthly installments

use bigdecimal::BigDecimal;
use tracing::{debug, info, warn};

use crate::config::EditConfig;
use crate::traits::*;
use crate::types::*;
use crate::utils::{calendar, validation};

/// Divides one move line into installments and materializes them
pub struct Divisor<'a> {
    config: &'a EditConfig,
    validator: &'a dyn CompatibilityValidator,
}

impl<'a> Divisor<'a> {
    /// Create a divisor with the given settings and validator
    pub fn new(config: &'a EditConfig, validator: &'a dyn CompatibilityValidator) -> Self {
        Self { config, validator }
    }

    /// Compute installments for a source line without touching storage.
    ///
    /// Every installment gets the total divided by `division_count`, rounded
    /// with the line's currency; the rounding drift goes to the first one.
    pub fn compute_divisions(
        source: &MoveLine,
        division_count: u32,
    ) -> EditResult<Vec<DivisionLine>> {
        if division_count < 2 {
            return Err(EditError::InvalidDivisionCount(division_count));
        }
        let first_due = validation::validate_maturity_date(source)?;
        let total = source.total_amount();
        let per_division = source
            .currency
            .round(&(&total / BigDecimal::from(division_count)));

        let mut divisions: Vec<DivisionLine> =
            calendar::monthly_schedule(first_due, division_count)?
                .into_iter()
                .map(|due_date| DivisionLine {
                    amount: per_division.clone(),
                    due_date,
                    name: source.name.clone(),
                    customer_id: source.partner_id.clone(),
                })
                .collect();

        let generated: BigDecimal = divisions.iter().map(|d| &d.amount).sum();
        let drift = &total - &generated;
        if let Some(first) = divisions.first_mut() {
            first.amount += drift;
        }

        Ok(divisions)
    }

    /// Regenerate the request's installments from the single selected line
    pub async fn generate_divisions<S: MoveLineStorage>(
        &self,
        storage: &S,
        request: &mut DivisionRequest,
        selected_ids: &[String],
    ) -> EditResult<()> {
        validation::validate_division_count(request.division_count, self.config)?;
        request.reset();

        let line_id = validation::validate_single_selection(selected_ids)?;
        let source = storage
            .search_lines(&[line_id.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EditError::MoveLineNotFound(line_id.to_string()))?;

        let divisions = Self::compute_divisions(&source, request.division_count)?;
        debug!(
            line_id = %source.id,
            divisions = divisions.len(),
            total = %source.total_amount(),
            "generated division lines"
        );

        request.move_line_id = Some(source.id.clone());
        request.move_line_value = source.total_amount();
        request.side = source.populated_side();
        request.division_lines = divisions;
        Ok(())
    }

    /// Replace the source line with one move line per installment
    pub async fn apply_split<S: MoveLineStorage>(
        &self,
        storage: &mut S,
        request: &DivisionRequest,
    ) -> EditResult<Vec<MoveLine>> {
        let source_id = match request.move_line_id.as_deref() {
            Some(id) if !request.division_lines.is_empty() => id,
            _ => return Err(EditError::DivisionsNotGenerated),
        };
        let source = storage
            .get_line(source_id)
            .await?
            .ok_or_else(|| EditError::MoveLineNotFound(source_id.to_string()))?;

        self.validator
            .validate_lines(std::slice::from_ref(&source))?;

        // Every populated side must match, so a line with both sides set is refused
        let side = source.populated_side();
        let divisions_total = source.currency.round(&request.divisions_total());
        let zero = BigDecimal::from(0);
        for amount in [&source.debit, &source.credit] {
            if amount > &zero && amount != &divisions_total {
                return Err(EditError::AmountMismatch {
                    divisions_total,
                    original_total: request.move_line_value.clone(),
                });
            }
        }

        let expected = request.division_lines.len();
        let mut created: Vec<MoveLine> = Vec::with_capacity(expected);
        if let Some(side) = side {
            for division in &request.division_lines {
                let values = MoveLineValues::on_side(
                    &source,
                    side,
                    division.amount.clone(),
                    Some(division.due_date),
                );
                match storage
                    .create_line(&values, !self.config.defer_move_validity)
                    .await
                {
                    Ok(line) => {
                        debug!(
                            line_id = %line.id,
                            amount = %division.amount,
                            due_date = %division.due_date,
                            "created division line"
                        );
                        created.push(line);
                    }
                    Err(err) => {
                        warn!(
                            source_id = %source.id,
                            error = %err,
                            "failed to create division line"
                        );
                        break;
                    }
                }
            }
        }

        if created.len() != expected {
            let created_ids: Vec<String> = created.iter().map(|l| l.id.clone()).collect();
            if !created_ids.is_empty() {
                warn!(
                    source_id = %source.id,
                    removed = created_ids.len(),
                    "removing partially created division lines"
                );
                if let Err(err) = storage.unlink_lines(&created_ids, true).await {
                    warn!(
                        source_id = %source.id,
                        error = %err,
                        "failed to remove partially created division lines"
                    );
                }
            }
            return Err(EditError::CreationIncomplete {
                expected,
                created: created.len(),
            });
        }

        storage.unlink_lines(&[source.id.clone()], true).await?;
        info!(
            source_id = %source.id,
            move_id = %source.move_id,
            lines = created.len(),
            "split move line"
        );
        Ok(created)
    }
}
