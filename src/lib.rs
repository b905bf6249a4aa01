//! # Move Line Edit
//!
//! Split a journal-entry line into monthly installments and merge compatible
//! lines of the same entry back into one.
//!
//! ## Features
//!
//! - **Split**: divide a line's amount into N installments rounded with the company
//!   currency, rounding drift absorbed by the first installment
//! - **Merge**: combine lines of the same entry and account into a single line
//! - **Compatibility rules**: same entry, same account, no reconciled lines
//! - **Unit of work**: every mutating operation commits or rolls back as a whole
//! - **Storage abstraction**: ledger-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use move_line_edit::utils::MemoryStorage;
//! use move_line_edit::{MoveLine, MoveLineEditor, MoveLineStorage};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # async fn run() -> move_line_edit::EditResult<()> {
//! let mut storage = MemoryStorage::new();
//! let mut line = MoveLine::new("l1".into(), "inv1".into(), "receivable".into(), "sales".into())
//!     .with_debit(BigDecimal::from(100));
//! line.date_maturity = NaiveDate::from_ymd_opt(2024, 1, 31);
//! storage.save_line(&line).await?;
//!
//! let mut editor = MoveLineEditor::new(storage);
//! let mut session = editor.action_split_move_lines(vec!["l1".to_string()]);
//! session.request.division_count = 3;
//! editor.generate_divisions(&mut session).await?;
//! let installments = editor.apply_split(&session).await?;
//! assert_eq!(installments.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod editor;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::EditConfig;
pub use editor::*;
pub use traits::*;
pub use types::*;
