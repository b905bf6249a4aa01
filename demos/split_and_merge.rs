//! Split a receivable into installments, then merge them back

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use move_line_edit::utils::{logging, MemoryStorage};
use move_line_edit::{EditConfig, MoveLine, MoveLineEditor, MoveLineStorage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    println!("🧾 Move Line Edit - Split and Merge Example\n");

    // 1. A posted customer invoice: receivable 1,000 against revenue
    let mut storage = MemoryStorage::new();
    let mut receivable = MoveLine::new(
        "inv001_rec".to_string(),
        "INV/2024/001".to_string(),
        "accounts_receivable".to_string(),
        "sales".to_string(),
    )
    .with_debit(BigDecimal::from(1000));
    receivable.name = "INV/2024/001".to_string();
    receivable.partner_id = Some("acme".to_string());
    receivable.date_maturity = NaiveDate::from_ymd_opt(2024, 1, 31);
    receivable.posted = true;

    let mut revenue = MoveLine::new(
        "inv001_rev".to_string(),
        "INV/2024/001".to_string(),
        "sales_revenue".to_string(),
        "sales".to_string(),
    )
    .with_credit(BigDecimal::from(1000));
    revenue.posted = true;

    storage.save_line(&receivable).await?;
    storage.save_line(&revenue).await?;

    let mut editor = MoveLineEditor::new(storage).with_config(EditConfig::from_env()?)?;

    // 2. Split the receivable into three monthly installments
    println!("✂️  Splitting receivable into installments...");
    let mut session = editor.action_split_move_lines(vec!["inv001_rec".to_string()]);
    session.request.division_count = 3;
    for division in editor.generate_divisions(&mut session).await? {
        println!("  {} due {}", division.amount, division.due_date);
    }

    let installments = editor.apply_split(&session).await?;
    println!("  ✓ Created {} installment lines", installments.len());
    println!(
        "  Entry balance: {}\n",
        editor.storage().move_balance("INV/2024/001")?
    );

    // 3. Merge them back into a single line due at the end of the quarter
    println!("🔗 Merging installments...");
    let ids = installments.iter().map(|l| l.id.clone()).collect();
    let mut merge = editor.action_merge_move_lines(ids);
    merge.request.aggregation_date = NaiveDate::from_ymd_opt(2024, 3, 31);
    let merged = editor.merge_lines(&merge).await?;
    println!(
        "  ✓ Merged line {}: debit {} due {:?}",
        merged.id, merged.debit, merged.date_maturity
    );

    Ok(())
}
