//! Basic journal workflow example

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use ledger_core::{
    patterns, EntryBuilder, Journal, JournalType, Ledger, MemoryStorage, ReportScope,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧾 Ledger Core - Basic Journal Example\n");

    // Create a new ledger with in-memory storage
    let storage = MemoryStorage::new();
    let mut ledger = Ledger::new(storage);

    // 1. Set up the chart of accounts, a fiscal year and a journal
    println!("📊 Setting up Chart of Accounts...");
    let summary = ledger.seed_default_chart().await?;
    println!("  ✓ Created {} accounts", summary.created);
    for account in ledger.list_accounts().await? {
        println!(
            "  ✓ {} - {} ({:?})",
            account.code, account.name, account.account_type
        );
    }
    println!();

    ledger
        .create_fiscal_year(
            2025,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        )
        .await?;
    ledger
        .create_journal(Journal::new("GEN", "General", JournalType::General).as_default())
        .await?;
    println!("📅 Fiscal year 2025 and journal GEN ready\n");

    // 2. Book some business transactions
    println!("💰 Recording Business Transactions...\n");

    // Owner invests cash in the business
    let mut investment = ledger_core::NewEntry::new(
        "GEN",
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
    );
    investment.description = "Initial owner investment".to_string();
    investment.lines = patterns::owner_investment("1000", "3000", BigDecimal::from(50_000));
    let investment = ledger.create_entry(investment).await?;
    let investment = ledger.post_entry(investment.id, None).await?;
    println!(
        "  ✓ {} Owner investment of 50,000 (posted)",
        investment.number
    );

    // A cash sale
    let sale = EntryBuilder::new("GEN", NaiveDate::from_ymd_opt(2025, 1, 10).unwrap())
        .description("Cash sale")
        .debit("1000", BigDecimal::from(12_000))
        .credit("4000", BigDecimal::from(12_000))
        .build()?;
    let sale = ledger.create_entry(sale).await?;
    let sale = ledger.post_entry(sale.id, None).await?;
    println!("  ✓ {} Cash sale of 12,000 (posted)", sale.number);

    // Rent paid from the bank
    let rent = EntryBuilder::new("GEN", NaiveDate::from_ymd_opt(2025, 1, 31).unwrap())
        .description("January office rent")
        .debit("5100", BigDecimal::from(3_000))
        .credit("1000", BigDecimal::from(3_000))
        .build()?;
    let rent = ledger.create_entry(rent).await?;
    let rent = ledger.post_entry(rent.id, None).await?;
    println!("  ✓ {} Office rent of 3,000 (posted)\n", rent.number);

    // 3. The sale turns out to be wrong: reverse it
    println!("↩️  Reversing the sale...");
    let reversal = ledger
        .reverse_entry(sale.id, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(), None)
        .await?;
    println!("  ✓ {} reverses {}\n", reversal.number, sale.number);

    // 4. Reports
    println!("📈 Trial Balance for 2025:");
    let tb = ledger.trial_balance(&ReportScope::fiscal_year(2025)).await?;
    for row in &tb.rows {
        println!(
            "  {:<6} {:<40} {:>10} {:>10}",
            row.code, row.name, row.debit, row.credit
        );
    }
    println!(
        "  {:<47} {:>10} {:>10}  balanced: {}",
        "TOTAL",
        tb.total_debit,
        tb.total_credit,
        tb.is_balanced()
    );
    println!();

    println!("📒 Cash ledger for January:");
    let cash = ledger
        .account_ledger(
            "1000",
            &ReportScope::date_range(
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            ),
        )
        .await?;
    println!("  Opening balance: {}", cash.opening_balance);
    for row in &cash.rows {
        println!(
            "  {} {:<14} {:>10} {:>10} {:>12}",
            row.date, row.number, row.debit, row.credit, row.balance
        );
    }
    println!("  Closing balance: {}", cash.closing_balance);

    Ok(())
}
