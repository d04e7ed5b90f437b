mod common;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use common::{purchase_input, seed_company_with_class, seed_user, setup};
use shareledger_core::domain::{ShareStatus, ShareTransactionKind, ShareTransactionStatus};
use shareledger_core::ports::LedgerStore;
use shareledger_core::services::SaleInput;
use shareledger_core::LedgerError;

fn sale(lot_id: Uuid, quantity: i64) -> SaleInput {
    SaleInput {
        lot_id,
        quantity,
        price_per_share: BigDecimal::from(12),
        payment_method: "bank_transfer".to_string(),
        currency: "NOK".to_string(),
    }
}

#[tokio::test]
async fn partial_sale_then_full_sale_then_rejection() {
    let ctx = setup();
    let (_, share_class) = seed_company_with_class(&ctx.store, 1000, 10);
    let user = seed_user(&ctx.store, "Kari Nordmann");

    let purchase = ctx
        .ledger
        .purchase_shares(purchase_input(&user, &share_class, 50))
        .await
        .expect("purchase");

    let first = ctx
        .ledger
        .record_sale(sale(purchase.lot_id, 20))
        .await
        .expect("first sale");
    assert_eq!(first.remaining_shares, 30);
    assert_eq!(first.status, ShareStatus::PartiallySold);

    let second = ctx
        .ledger
        .record_sale(sale(purchase.lot_id, 30))
        .await
        .expect("second sale");
    assert_eq!(second.remaining_shares, 0);
    assert_eq!(second.status, ShareStatus::Sold);

    let err = ctx
        .ledger
        .record_sale(sale(purchase.lot_id, 1))
        .await
        .expect_err("sold lot rejects further sales");
    assert!(matches!(
        err,
        LedgerError::InsufficientShares { remaining: 0, .. }
    ));
}

#[tokio::test]
async fn sale_over_remaining_is_rejected_and_changes_nothing() {
    let ctx = setup();
    let (_, share_class) = seed_company_with_class(&ctx.store, 1000, 10);
    let user = seed_user(&ctx.store, "Kari Nordmann");

    let purchase = ctx
        .ledger
        .purchase_shares(purchase_input(&user, &share_class, 50))
        .await
        .expect("purchase");

    let err = ctx
        .ledger
        .record_sale(sale(purchase.lot_id, 51))
        .await
        .expect_err("more than the lot holds");
    assert!(matches!(
        err,
        LedgerError::InsufficientShares {
            requested: 51,
            remaining: 50
        }
    ));

    let lot = ctx.store.lot(purchase.lot_id).await.unwrap().expect("lot");
    assert_eq!(lot.remaining_shares, 50);
    assert_eq!(lot.status, ShareStatus::Active);

    // The rejected sale must not leave a movement behind.
    let movements = ctx
        .store
        .share_transactions_for_lot(purchase.lot_id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].kind, ShareTransactionKind::Buy);
}

#[tokio::test]
async fn remaining_shares_match_the_completed_sell_log() {
    let ctx = setup();
    let (_, share_class) = seed_company_with_class(&ctx.store, 1000, 10);
    let user = seed_user(&ctx.store, "Kari Nordmann");

    let purchase = ctx
        .ledger
        .purchase_shares(purchase_input(&user, &share_class, 80))
        .await
        .expect("purchase");

    for quantity in [15, 25, 10] {
        ctx.ledger
            .record_sale(sale(purchase.lot_id, quantity))
            .await
            .expect("sale");
    }

    let lot = ctx.store.lot(purchase.lot_id).await.unwrap().expect("lot");
    let movements = ctx
        .store
        .share_transactions_for_lot(purchase.lot_id)
        .await
        .unwrap();

    let sold: i64 = movements
        .iter()
        .filter(|st| {
            st.kind == ShareTransactionKind::Sell
                && st.status == ShareTransactionStatus::Completed
        })
        .map(|st| st.quantity)
        .sum();
    assert_eq!(sold, 50);
    assert_eq!(lot.remaining_shares, lot.initial_shares - sold);
    assert_eq!(lot.status, ShareStatus::PartiallySold);
}

#[tokio::test]
async fn sale_against_unknown_lot_is_not_found() {
    let ctx = setup();

    let err = ctx
        .ledger
        .record_sale(sale(Uuid::new_v4(), 10))
        .await
        .expect_err("no such lot");
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[tokio::test]
async fn sale_rejects_non_positive_quantity_and_price() {
    let ctx = setup();
    let (_, share_class) = seed_company_with_class(&ctx.store, 1000, 10);
    let user = seed_user(&ctx.store, "Kari Nordmann");

    let purchase = ctx
        .ledger
        .purchase_shares(purchase_input(&user, &share_class, 50))
        .await
        .expect("purchase");

    let err = ctx
        .ledger
        .record_sale(sale(purchase.lot_id, 0))
        .await
        .expect_err("zero quantity");
    assert!(matches!(err, LedgerError::Validation(_)));

    let mut zero_price = sale(purchase.lot_id, 10);
    zero_price.price_per_share = BigDecimal::from(0);
    let err = ctx
        .ledger
        .record_sale(zero_price)
        .await
        .expect_err("zero price");
    assert!(matches!(err, LedgerError::Validation(_)));
}
