//! Integration tests for the transaction writer.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_core::ledger::{NewTransaction, TransactionFilter, TransactionStatus};
use tally_core::payment::{PaymentDetails, PaymentType};
use tally_core::{LedgerError, Reference};
use tally_db::entities::sea_orm_active_enums::TransactionStatus as StoredStatus;
use tally_shared::types::{GroupId, PaymentMethodId, TransactionId, UserId};

#[tokio::test]
async fn test_create_transaction_starts_pending() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;

    let tx = ledger
        .transactions()
        .create_transaction(NewTransaction::new(a, b, dec!(12.5)).with_purpose("  lunch "))
        .await
        .unwrap();

    assert!(tx.id > 0);
    assert_eq!(tx.status, StoredStatus::Pending);
    assert_eq!(tx.retry_count, 0);
    assert_eq!(tx.purpose.as_deref(), Some("lunch"));
    assert_eq!(tx.group_id, None);
    assert_eq!(tx.failure_reason, None);
}

#[tokio::test]
async fn test_missing_references_persist_nothing() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;
    let ghost = UserId::new(404);

    let cases = [
        (NewTransaction::new(ghost, b, dec!(10)), "user"),
        (NewTransaction::new(a, ghost, dec!(10)), "user"),
        (
            NewTransaction::new(a, b, dec!(10)).in_group(GroupId::new(404)),
            "group",
        ),
        (
            NewTransaction::new(a, b, dec!(10)).paid_with(PaymentMethodId::new(404)),
            "payment method",
        ),
    ];

    for (input, kind) in cases {
        let result = ledger.transactions().create_transaction(input).await;
        match result {
            Err(LedgerError::ReferenceNotFound(reference)) => assert_eq!(reference.kind(), kind),
            other => panic!("expected missing {kind}, got {other:?}"),
        }
    }

    assert!(
        ledger
            .transactions()
            .get_transactions_by_lender_id(a)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(
        ledger
            .transactions()
            .get_transactions_by_borrower_id(b)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_non_positive_amount_rejected_before_lookup() {
    let ledger = common::setup().await;

    for amount in [Decimal::ZERO, dec!(-5)] {
        let result = ledger
            .transactions()
            .create_transaction(NewTransaction::new(UserId::new(404), UserId::new(405), amount))
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
    }
}

#[tokio::test]
async fn test_status_state_machine() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;
    let tx = ledger
        .transactions()
        .create_transaction(NewTransaction::new(a, b, dec!(40)))
        .await
        .unwrap();
    let id = TransactionId::new(tx.id);

    let failed = ledger
        .transactions()
        .mark_transaction_failed(id, "card declined")
        .await
        .unwrap();
    assert_eq!(failed.status, StoredStatus::Failed);
    assert_eq!(failed.failure_reason.as_deref(), Some("card declined"));

    let retried = ledger
        .transactions()
        .update_transaction_status(id, TransactionStatus::Pending)
        .await
        .unwrap();
    assert_eq!(retried.status, StoredStatus::Pending);
    assert_eq!(retried.retry_count, 1);
    assert_eq!(retried.failure_reason, None);

    let completed = ledger
        .transactions()
        .update_transaction_status(id, TransactionStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.status, StoredStatus::Completed);

    let reopened = ledger
        .transactions()
        .update_transaction_status(id, TransactionStatus::Pending)
        .await;
    assert!(matches!(
        reopened,
        Err(LedgerError::InvalidTransition { entity: "transaction", .. })
    ));
}

#[tokio::test]
async fn test_update_missing_transaction() {
    let ledger = common::setup().await;

    let result = ledger
        .transactions()
        .update_transaction_status(TransactionId::new(9), TransactionStatus::Completed)
        .await;

    assert!(matches!(
        result,
        Err(LedgerError::ReferenceNotFound(Reference::Transaction(_)))
    ));
    assert!(
        ledger
            .transactions()
            .get_transaction_by_id(TransactionId::new(9))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_blank_failure_reason_rejected() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;
    let tx = ledger
        .transactions()
        .create_transaction(NewTransaction::new(a, b, dec!(40)))
        .await
        .unwrap();

    let result = ledger
        .transactions()
        .mark_transaction_failed(TransactionId::new(tx.id), "  ")
        .await;

    assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_delete_transaction_removes_splits() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;
    let tx = ledger
        .transactions()
        .create_transaction(NewTransaction::new(a, b, dec!(40)))
        .await
        .unwrap();
    let id = TransactionId::new(tx.id);
    ledger
        .splits()
        .create_transaction_split(id, b, dec!(20))
        .await
        .unwrap();

    ledger.transactions().delete_transaction(id).await.unwrap();

    assert!(ledger.transactions().get_transaction_by_id(id).await.unwrap().is_none());
    assert!(ledger.splits().get_transaction_splits(id).await.unwrap().is_empty());

    let again = ledger.transactions().delete_transaction(id).await;
    assert!(matches!(again, Err(ref e) if e.error_code() == "TRANSACTION_NOT_FOUND"));
}

#[tokio::test]
async fn test_listing_by_unknown_user_fails() {
    let ledger = common::setup().await;

    let result = ledger
        .transactions()
        .get_transactions_by_lender_id(UserId::new(404))
        .await;

    assert!(matches!(result, Err(ref e) if e.error_code() == "USER_NOT_FOUND"));
}

#[tokio::test]
async fn test_search_requires_a_filter() {
    let ledger = common::setup().await;

    let result = ledger
        .transactions()
        .search_transactions(&TransactionFilter::default())
        .await;

    assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_search_single_filter_matches_exactly() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;
    let c = common::user_id(&ledger, "c@x.com").await;
    let trip = common::group_id(&ledger, "trip", a).await;
    let method = ledger
        .payment_methods()
        .create_payment_method("a@x.com", PaymentType::Upi, PaymentDetails::upi("alice@upi"))
        .await
        .unwrap();

    let t1 = ledger
        .transactions()
        .create_transaction(NewTransaction::new(a, b, dec!(10)).in_group(trip))
        .await
        .unwrap();
    let t2 = ledger
        .transactions()
        .create_transaction(
            NewTransaction::new(a, c, dec!(50)).paid_with(PaymentMethodId::new(method.id)),
        )
        .await
        .unwrap();
    let t3 = ledger
        .transactions()
        .create_transaction(NewTransaction::new(b, c, dec!(75)).in_group(trip))
        .await
        .unwrap();
    ledger
        .transactions()
        .update_transaction_status(TransactionId::new(t3.id), TransactionStatus::Completed)
        .await
        .unwrap();

    let ids = |rows: Vec<tally_db::entities::transactions::Model>| -> Vec<i32> {
        rows.into_iter().map(|t| t.id).collect()
    };
    let search = |filter: TransactionFilter| {
        let ledger = ledger.clone();
        async move { ledger.transactions().search_transactions(&filter).await.unwrap() }
    };

    let by_lender = search(TransactionFilter {
        lender_id: Some(a),
        ..TransactionFilter::default()
    })
    .await;
    assert_eq!(ids(by_lender), vec![t1.id, t2.id]);

    let by_borrower = search(TransactionFilter {
        borrower_id: Some(c),
        ..TransactionFilter::default()
    })
    .await;
    assert_eq!(ids(by_borrower), vec![t2.id, t3.id]);

    let by_group = search(TransactionFilter {
        group_id: Some(trip),
        ..TransactionFilter::default()
    })
    .await;
    assert_eq!(ids(by_group), vec![t1.id, t3.id]);

    let by_status = search(TransactionFilter {
        status: Some(TransactionStatus::Completed),
        ..TransactionFilter::default()
    })
    .await;
    assert_eq!(ids(by_status), vec![t3.id]);

    let by_method = search(TransactionFilter {
        payment_method_id: Some(PaymentMethodId::new(method.id)),
        ..TransactionFilter::default()
    })
    .await;
    assert_eq!(ids(by_method), vec![t2.id]);

    let by_range = search(TransactionFilter {
        min_amount: Some(dec!(10)),
        max_amount: Some(dec!(50)),
        ..TransactionFilter::default()
    })
    .await;
    assert_eq!(ids(by_range), vec![t1.id, t2.id]);

    let combined = search(TransactionFilter {
        lender_id: Some(a),
        group_id: Some(trip),
        ..TransactionFilter::default()
    })
    .await;
    assert_eq!(ids(combined), vec![t1.id]);
}
