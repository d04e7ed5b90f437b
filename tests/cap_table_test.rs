mod common;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use common::{purchase_input, seed_company_with_class, seed_user, setup};
use shareledger_core::domain::{HoldingCompany, Identifier, ShareClass};
use shareledger_core::ports::LedgerStore;
use shareledger_core::services::SaleInput;
use shareledger_core::LedgerError;

#[tokio::test]
async fn two_holders_split_twenty_five_seventy_five() {
    let ctx = setup();
    let (company, share_class) = seed_company_with_class(&ctx.store, 100, 10);
    let minor = seed_user(&ctx.store, "Kari Nordmann");
    let major = seed_user(&ctx.store, "Ola Hansen");

    ctx.ledger
        .purchase_shares(purchase_input(&minor, &share_class, 25))
        .await
        .expect("first purchase");
    ctx.ledger
        .purchase_shares(purchase_input(&major, &share_class, 75))
        .await
        .expect("second purchase");

    let entries = ctx.ledger.cap_table(company.id).await.expect("cap table");
    assert_eq!(entries.len(), 2);

    // Sorted by descending holder total.
    assert_eq!(entries[0].user_id, major.id);
    assert_eq!(entries[0].total_shares, 75);
    assert_eq!(entries[0].percentage_ownership, 75.00);
    assert_eq!(entries[1].user_id, minor.id);
    assert_eq!(entries[1].total_shares, 25);
    assert_eq!(entries[1].percentage_ownership, 25.00);

    let sum: f64 = entries.iter().map(|e| e.percentage_ownership).sum();
    assert!((sum - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn cap_table_is_idempotent_including_row_order() {
    let ctx = setup();
    let (company, share_class) = seed_company_with_class(&ctx.store, 1000, 10);
    for (name, quantity) in [("Kari Nordmann", 120), ("Ola Hansen", 340), ("Per Olsen", 340)] {
        let user = seed_user(&ctx.store, name);
        ctx.ledger
            .purchase_shares(purchase_input(&user, &share_class, quantity))
            .await
            .expect("purchase");
    }

    let first = ctx.ledger.cap_table(company.id).await.expect("first read");
    let second = ctx.ledger.cap_table(company.id).await.expect("second read");

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.user_id, b.user_id);
        assert_eq!(a.share_class_id, b.share_class_id);
        assert_eq!(a.holding_company_id, b.holding_company_id);
        assert_eq!(a.shares, b.shares);
        assert_eq!(a.percentage_ownership, b.percentage_ownership);
    }
}

#[tokio::test]
async fn row_shares_sum_to_outstanding_lot_shares() {
    let ctx = setup();
    let (company, share_class) = seed_company_with_class(&ctx.store, 1000, 10);
    let kari = seed_user(&ctx.store, "Kari Nordmann");
    let ola = seed_user(&ctx.store, "Ola Hansen");

    let purchase = ctx
        .ledger
        .purchase_shares(purchase_input(&kari, &share_class, 400))
        .await
        .expect("purchase");
    ctx.ledger
        .purchase_shares(purchase_input(&ola, &share_class, 250))
        .await
        .expect("purchase");
    ctx.ledger
        .record_sale(SaleInput {
            lot_id: purchase.lot_id,
            quantity: 150,
            price_per_share: BigDecimal::from(12),
            payment_method: "bank_transfer".to_string(),
            currency: "NOK".to_string(),
        })
        .await
        .expect("sale");

    let entries = ctx.ledger.cap_table(company.id).await.expect("cap table");
    let table_total: i64 = entries.iter().map(|e| e.shares).sum();

    let lots = ctx.store.lots_for_company(company.id, false).await.unwrap();
    let lot_total: i64 = lots.iter().map(|l| l.remaining_shares).sum();

    assert_eq!(table_total, lot_total);
    assert_eq!(table_total, 500);
}

#[tokio::test]
async fn dual_route_holder_gets_two_rows_counted_once() {
    let ctx = setup();
    let (company, share_class) = seed_company_with_class(&ctx.store, 1000, 10);
    let kari = seed_user(&ctx.store, "Kari Nordmann");
    let ola = seed_user(&ctx.store, "Ola Hansen");
    let holding = HoldingCompany::new(kari.id, "Nordmann Invest AS", "912345678");
    ctx.store.seed_holding_company(holding.clone());

    ctx.ledger
        .purchase_shares(purchase_input(&kari, &share_class, 100))
        .await
        .expect("direct purchase");

    let mut routed = purchase_input(&kari, &share_class, 200);
    routed.holding_company_id = Some(holding.id);
    routed.identifier = Identifier::registration_number("912345678");
    ctx.ledger
        .purchase_shares(routed)
        .await
        .expect("routed purchase");

    ctx.ledger
        .purchase_shares(purchase_input(&ola, &share_class, 100))
        .await
        .expect("other holder");

    let summary = ctx
        .ledger
        .cap_table_summary(company.id)
        .await
        .expect("summary");

    // Kari appears twice (direct and via holding company) but is one holder.
    let kari_rows: Vec<_> = summary
        .entries
        .iter()
        .filter(|e| e.user_id == kari.id)
        .collect();
    assert_eq!(kari_rows.len(), 2);
    assert_eq!(summary.shareholder_count, 2);
    assert_eq!(summary.total_outstanding_shares, 400);

    // Direct row sorts before the routed row; both carry the holder total.
    assert!(!kari_rows[0].is_holding_company);
    assert!(kari_rows[1].is_holding_company);
    assert_eq!(
        kari_rows[1].holding_company_name.as_deref(),
        Some("Nordmann Invest AS")
    );
    for row in &kari_rows {
        assert_eq!(row.total_shares, 300);
        assert_eq!(row.percentage_ownership, 75.00);
    }
}

#[tokio::test]
async fn multiple_share_classes_produce_one_row_each() {
    let ctx = setup();
    let (company, ordinary) = seed_company_with_class(&ctx.store, 1000, 10);
    let preferred = ShareClass::new(company.id, "Preferred", 500, BigDecimal::from(20));
    ctx.store.seed_share_class(preferred.clone());
    let kari = seed_user(&ctx.store, "Kari Nordmann");

    ctx.ledger
        .purchase_shares(purchase_input(&kari, &ordinary, 100))
        .await
        .expect("ordinary purchase");
    ctx.ledger
        .purchase_shares(purchase_input(&kari, &preferred, 50))
        .await
        .expect("preferred purchase");

    let entries = ctx.ledger.cap_table(company.id).await.expect("cap table");
    assert_eq!(entries.len(), 2);

    // Rows for one holder sort by class name; totals span both classes.
    assert_eq!(entries[0].share_class_name, "Ordinary");
    assert_eq!(entries[0].shares, 100);
    assert_eq!(entries[1].share_class_name, "Preferred");
    assert_eq!(entries[1].shares, 50);
    for entry in &entries {
        assert_eq!(entry.total_shares, 150);
        assert_eq!(entry.percentage_ownership, 100.00);
    }
}

#[tokio::test]
async fn company_with_no_lots_has_empty_cap_table() {
    let ctx = setup();
    let (company, _) = seed_company_with_class(&ctx.store, 1000, 10);

    let entries = ctx.ledger.cap_table(company.id).await.expect("cap table");
    assert!(entries.is_empty());

    let summary = ctx
        .ledger
        .cap_table_summary(company.id)
        .await
        .expect("summary");
    assert_eq!(summary.total_outstanding_shares, 0);
    assert_eq!(summary.shareholder_count, 0);
}

#[tokio::test]
async fn fully_sold_lots_drop_out_of_the_cap_table() {
    let ctx = setup();
    let (company, share_class) = seed_company_with_class(&ctx.store, 1000, 10);
    let kari = seed_user(&ctx.store, "Kari Nordmann");

    let purchase = ctx
        .ledger
        .purchase_shares(purchase_input(&kari, &share_class, 100))
        .await
        .expect("purchase");
    ctx.ledger
        .record_sale(SaleInput {
            lot_id: purchase.lot_id,
            quantity: 100,
            price_per_share: BigDecimal::from(12),
            payment_method: "bank_transfer".to_string(),
            currency: "NOK".to_string(),
        })
        .await
        .expect("full exit");

    let entries = ctx.ledger.cap_table(company.id).await.expect("cap table");
    assert!(entries.is_empty());
}

#[tokio::test]
async fn unknown_company_is_not_found() {
    let ctx = setup();

    let err = ctx
        .ledger
        .cap_table(Uuid::new_v4())
        .await
        .expect_err("no such company");
    assert!(matches!(err, LedgerError::NotFound(_)));
}
