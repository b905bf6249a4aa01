//! Core types and data structures for move line editing

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Side of a move line carrying its amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntrySide {
    /// Debit side - receivables, expenses
    Debit,
    /// Credit side - payables, income
    Credit,
}

/// Company currency, which decides how amounts are rounded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO code (EUR, USD, INR, ...)
    pub code: String,
    /// Number of decimal places amounts are rounded to
    pub decimal_places: u32,
}

impl Currency {
    /// Create a new currency
    pub fn new(code: impl Into<String>, decimal_places: u32) -> Self {
        Self {
            code: code.into(),
            decimal_places,
        }
    }

    /// Round an amount to the currency precision, half away from zero
    pub fn round(&self, amount: &BigDecimal) -> BigDecimal {
        amount.with_scale_round(i64::from(self.decimal_places), RoundingMode::HalfUp)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::new("EUR", 2)
    }
}

/// A single debit/credit line belonging to a journal entry (move)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveLine {
    /// Unique identifier for the line
    pub id: String,
    /// Journal entry owning this line
    pub move_id: String,
    pub account_id: String,
    pub journal_id: String,
    pub partner_id: Option<String>,
    /// Label of the line, used as concept for installments
    pub name: String,
    pub partner_ref: Option<String>,
    pub invoice_origin: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    /// Accounting date
    pub date: Option<NaiveDate>,
    pub payment_term_id: Option<String>,
    /// Analytic account id to percentage
    pub analytic_distribution: HashMap<String, BigDecimal>,
    pub display_type: Option<String>,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    /// debit - credit
    pub balance: BigDecimal,
    pub amount_residual: BigDecimal,
    /// Due date of the line
    pub date_maturity: Option<NaiveDate>,
    pub reconciled: bool,
    pub full_reconcile_id: Option<String>,
    /// Posted lines are locked against plain deletion
    pub posted: bool,
    /// Currency of the owning company
    pub currency: Currency,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl MoveLine {
    /// Create a new, unposted line with zero amounts
    pub fn new(id: String, move_id: String, account_id: String, journal_id: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            move_id,
            account_id,
            journal_id,
            partner_id: None,
            name: String::new(),
            partner_ref: None,
            invoice_origin: None,
            invoice_date: None,
            date: None,
            payment_term_id: None,
            analytic_distribution: HashMap::new(),
            display_type: None,
            debit: BigDecimal::from(0),
            credit: BigDecimal::from(0),
            balance: BigDecimal::from(0),
            amount_residual: BigDecimal::from(0),
            date_maturity: None,
            reconciled: false,
            full_reconcile_id: None,
            posted: false,
            currency: Currency::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the debit amount, clearing the credit side
    pub fn with_debit(mut self, amount: BigDecimal) -> Self {
        self.debit = amount;
        self.credit = BigDecimal::from(0);
        self.refresh_balance();
        self
    }

    /// Set the credit amount, clearing the debit side
    pub fn with_credit(mut self, amount: BigDecimal) -> Self {
        self.credit = amount;
        self.debit = BigDecimal::from(0);
        self.refresh_balance();
        self
    }

    /// Recompute balance and residual from debit and credit
    pub fn refresh_balance(&mut self) {
        self.balance = &self.debit - &self.credit;
        self.amount_residual = self.balance.clone();
    }

    /// The side holding the line's value.
    ///
    /// Debit wins when both sides are positive; `None` when both are zero.
    pub fn populated_side(&self) -> Option<EntrySide> {
        let zero = BigDecimal::from(0);
        if self.debit > zero {
            Some(EntrySide::Debit)
        } else if self.credit > zero {
            Some(EntrySide::Credit)
        } else {
            None
        }
    }

    /// Amount on the given side
    pub fn amount_on(&self, side: EntrySide) -> &BigDecimal {
        match side {
            EntrySide::Debit => &self.debit,
            EntrySide::Credit => &self.credit,
        }
    }

    /// Value of the line on its populated side, zero if neither side is set
    pub fn total_amount(&self) -> BigDecimal {
        self.populated_side()
            .map(|side| self.amount_on(side).clone())
            .unwrap_or_else(|| BigDecimal::from(0))
    }
}

/// Fields carried over from an existing line to the lines replacing it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyableFields {
    pub move_id: String,
    pub account_id: String,
    pub journal_id: String,
    pub partner_id: Option<String>,
    pub name: String,
    pub partner_ref: Option<String>,
    pub invoice_origin: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    /// Accounting date, kept from the source line
    pub date: Option<NaiveDate>,
    pub payment_term_id: Option<String>,
    pub analytic_distribution: HashMap<String, BigDecimal>,
    pub display_type: Option<String>,
    pub currency: Currency,
}

impl From<&MoveLine> for CopyableFields {
    fn from(line: &MoveLine) -> Self {
        Self {
            move_id: line.move_id.clone(),
            account_id: line.account_id.clone(),
            journal_id: line.journal_id.clone(),
            partner_id: line.partner_id.clone(),
            name: line.name.clone(),
            partner_ref: line.partner_ref.clone(),
            invoice_origin: line.invoice_origin.clone(),
            invoice_date: line.invoice_date,
            date: line.date,
            payment_term_id: line.payment_term_id.clone(),
            analytic_distribution: line.analytic_distribution.clone(),
            display_type: line.display_type.clone(),
            currency: line.currency.clone(),
        }
    }
}

/// Values for creating a new move line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveLineValues {
    pub fields: CopyableFields,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    pub date_maturity: Option<NaiveDate>,
}

impl MoveLineValues {
    /// Build values from a source line, overriding amounts and date
    pub fn from_source(
        source: &MoveLine,
        debit: BigDecimal,
        credit: BigDecimal,
        date_maturity: Option<NaiveDate>,
    ) -> Self {
        Self {
            fields: CopyableFields::from(source),
            debit,
            credit,
            date_maturity,
        }
    }

    /// Build values with a single amount placed on the given side
    pub fn on_side(
        source: &MoveLine,
        side: EntrySide,
        amount: BigDecimal,
        date_maturity: Option<NaiveDate>,
    ) -> Self {
        let zero = BigDecimal::from(0);
        match side {
            EntrySide::Debit => Self::from_source(source, amount, zero, date_maturity),
            EntrySide::Credit => Self::from_source(source, zero, amount, date_maturity),
        }
    }

    /// debit - credit
    pub fn balance(&self) -> BigDecimal {
        &self.debit - &self.credit
    }

    /// Materialize the values into an unreconciled, unposted line
    pub fn into_move_line(self, id: String) -> MoveLine {
        let now = chrono::Utc::now().naive_utc();
        let balance = self.balance();
        let f = self.fields;
        MoveLine {
            id,
            move_id: f.move_id,
            account_id: f.account_id,
            journal_id: f.journal_id,
            partner_id: f.partner_id,
            name: f.name,
            partner_ref: f.partner_ref,
            invoice_origin: f.invoice_origin,
            invoice_date: f.invoice_date,
            date: f.date,
            payment_term_id: f.payment_term_id,
            analytic_distribution: f.analytic_distribution,
            display_type: f.display_type,
            debit: self.debit,
            credit: self.credit,
            amount_residual: balance.clone(),
            balance,
            date_maturity: self.date_maturity,
            reconciled: false,
            full_reconcile_id: None,
            posted: false,
            currency: f.currency,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One installment produced by the divisor before it becomes a move line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionLine {
    pub amount: BigDecimal,
    pub due_date: NaiveDate,
    /// Concept, copied from the source line name
    pub name: String,
    /// Customer, copied from the source line partner
    pub customer_id: Option<String>,
}

/// Scratch state of a split or merge in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionRequest {
    /// Number of installments to generate
    pub division_count: u32,
    /// Line being divided, set by generation
    pub move_line_id: Option<String>,
    /// Original value of the source line
    pub move_line_value: BigDecimal,
    /// Side the source line carries its value on
    pub side: Option<EntrySide>,
    /// Maturity date of a merged line
    pub aggregation_date: Option<NaiveDate>,
    pub division_lines: Vec<DivisionLine>,
}

impl DivisionRequest {
    /// Create an empty request
    pub fn new(division_count: u32) -> Self {
        Self {
            division_count,
            move_line_id: None,
            move_line_value: BigDecimal::from(0),
            side: None,
            aggregation_date: None,
            division_lines: Vec::new(),
        }
    }

    /// Sum of all division amounts
    pub fn divisions_total(&self) -> BigDecimal {
        self.division_lines.iter().map(|l| &l.amount).sum()
    }

    /// Drop generated lines and the source they came from
    pub fn reset(&mut self) {
        self.division_lines.clear();
        self.move_line_id = None;
        self.move_line_value = BigDecimal::from(0);
        self.side = None;
    }
}

impl Default for DivisionRequest {
    fn default() -> Self {
        Self::new(2)
    }
}

/// Errors that can occur while splitting or merging move lines
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("You must specify a valid number of divisions (got {0})")]
    InvalidDivisionCount(u32),
    #[error("To divide move lines you must select only one (got {0})")]
    MultipleLinesForSplit(usize),
    #[error("Cannot divide the move line '{name}' ({line_id}) as it does not have a maturity date")]
    MissingMaturityDate { line_id: String, name: String },
    #[error("Due date {date} plus {months} months is out of range")]
    DueDateOutOfRange { date: NaiveDate, months: u32 },
    #[error("You must generate the division lines first")]
    DivisionsNotGenerated,
    #[error("The sum of the division lines ({divisions_total}) does not match the original move line's value ({original_total})")]
    AmountMismatch {
        divisions_total: BigDecimal,
        original_total: BigDecimal,
    },
    #[error("The new move lines could not be generated correctly ({created} of {expected} created)")]
    CreationIncomplete { expected: usize, created: usize },
    #[error("Move line {line_id} belongs to entry {found}, expected {expected}: selected lines come from different entries")]
    CrossMoveSelection {
        line_id: String,
        expected: String,
        found: String,
    },
    #[error("Move line {line_id} belongs to account {found}, expected {expected}: selected lines come from different accounts")]
    CrossAccountSelection {
        line_id: String,
        expected: String,
        found: String,
    },
    #[error("You are trying to edit a reconciled move line: {0}")]
    ReconciledLineSelected(String),
    #[error("You have selected only one move line")]
    SingleLineForMerge,
    #[error("No move lines selected")]
    EmptySelection,
    #[error("Operation not available in a {0:?} session")]
    WrongSessionKind(SessionKind),
    #[error("Move line not found: {0}")]
    MoveLineNotFound(String),
    #[error("Move line {0} is posted and cannot be deleted")]
    LockedLine(String),
    #[error("Entry {move_id} would be unbalanced (balance {balance})")]
    UnbalancedMove { move_id: String, balance: BigDecimal },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for move line edit operations
pub type EditResult<T> = Result<T, EditError>;

/// What an edit session was opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    Split,
    Merge,
}

/// Editing session opened on a selection of move lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveLineEditSession {
    pub kind: SessionKind,
    /// Ids selected when the session was opened
    pub active_ids: Vec<String>,
    pub request: DivisionRequest,
}

impl MoveLineEditSession {
    /// Open a session on the given selection
    pub fn new(kind: SessionKind, active_ids: Vec<String>, division_count: u32) -> Self {
        Self {
            kind,
            active_ids,
            request: DivisionRequest::new(division_count),
        }
    }

    /// Ensure the session was opened for the given operation
    pub fn expect_kind(&self, kind: SessionKind) -> EditResult<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(EditError::WrongSessionKind(self.kind))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_currency_rounds_half_away_from_zero() {
        let eur = Currency::new("EUR", 2);
        assert_eq!(eur.round(&dec("33.335")), dec("33.34"));
        assert_eq!(eur.round(&dec("-33.335")), dec("-33.34"));
        assert_eq!(eur.round(&dec("33.3333")), dec("33.33"));

        let jpy = Currency::new("JPY", 0);
        assert_eq!(jpy.round(&dec("100.5")), dec("101"));
    }

    #[test]
    fn test_populated_side() {
        let line = MoveLine::new("l1".into(), "m1".into(), "a1".into(), "j1".into());
        assert_eq!(line.populated_side(), None);
        assert_eq!(line.total_amount(), BigDecimal::from(0));

        let credit = line.clone().with_credit(dec("100"));
        assert_eq!(credit.populated_side(), Some(EntrySide::Credit));
        assert_eq!(credit.balance, dec("-100"));

        let debit = line.with_debit(dec("40"));
        assert_eq!(debit.populated_side(), Some(EntrySide::Debit));
        assert_eq!(debit.total_amount(), dec("40"));
    }

    #[test]
    fn test_values_clear_reconciliation() {
        let mut source = MoveLine::new("l1".into(), "m1".into(), "a1".into(), "j1".into())
            .with_credit(dec("10"));
        source.reconciled = true;
        source.full_reconcile_id = Some("rec1".into());
        source.posted = true;
        source.date = NaiveDate::from_ymd_opt(2024, 1, 10);

        let due = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let line = MoveLineValues::on_side(&source, EntrySide::Credit, dec("4"), Some(due))
            .into_move_line("l2".into());

        assert!(!line.reconciled);
        assert!(!line.posted);
        assert_eq!(line.full_reconcile_id, None);
        assert_eq!(line.balance, dec("-4"));
        assert_eq!(line.amount_residual, dec("-4"));
        assert_eq!(line.date_maturity, Some(due));
        assert_eq!(line.date, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(line.move_id, "m1");
    }
}
