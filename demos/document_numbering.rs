//! Document numbering examples

use chrono::NaiveDate;
use ledger_core::{
    LedgerStorage, MemoryStorage, NumberContext, NumberingScheme, NumberingService, ResetPolicy,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔢 Ledger Core - Document Numbering Examples\n");

    let mut storage = MemoryStorage::new();

    // 1. Default schemes need no setup
    println!("📋 Default invoice numbering:");
    let mut service = NumberingService::new(storage.clone());
    let ctx = NumberContext::new().on_date(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
    for _ in 0..3 {
        let number = service.generate("accounting.Invoice", "number", &ctx).await?;
        println!("  ✓ {number}");
    }
    println!();

    // 2. A stored scheme overrides the default
    println!("📋 Custom monthly-reset purchase order scheme:");
    storage
        .save_scheme(
            &NumberingScheme::new(
                "purchases.Order",
                "PO/{year}/{month:02d}/{seq:03d}",
                ResetPolicy::Month,
            )
            .with_start(501),
        )
        .await?;

    let march = NumberContext::new().on_date(NaiveDate::from_ymd_opt(2025, 3, 20).unwrap());
    let april = NumberContext::new().on_date(NaiveDate::from_ymd_opt(2025, 4, 2).unwrap());
    println!(
        "  ✓ {}",
        service.generate("purchases.Order", "number", &march).await?
    );
    println!(
        "  ✓ {}",
        service.generate("purchases.Order", "number", &march).await?
    );
    println!(
        "  ✓ {}  (new month, counter restarts)",
        service.generate("purchases.Order", "number", &april).await?
    );
    println!();

    // 3. Prefix and extra placeholders
    println!("📋 Prefix-driven journal entry numbers:");
    let ctx = NumberContext::new()
        .on_date(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
        .with_prefix("SAL");
    for _ in 0..2 {
        let number = service.generate("ledger.JournalEntry", "number", &ctx).await?;
        println!("  ✓ {number}");
    }
    println!();

    // 4. Concurrent allocation stays collision-free
    println!("⚙️  32 concurrent allocations on one counter:");
    let mut handles = Vec::new();
    for _ in 0..32 {
        let mut handle = storage.clone();
        handles.push(tokio::spawn(async move {
            handle.next_sequence("demo.Concurrent", "", 1).await
        }));
    }
    let mut values = Vec::new();
    for handle in handles {
        values.push(handle.await??);
    }
    values.sort_unstable();
    println!("  ✓ got {} distinct values: {:?}...", values.len(), &values[..5]);
    assert_eq!(values, (1..=32).collect::<Vec<u64>>());

    Ok(())
}
