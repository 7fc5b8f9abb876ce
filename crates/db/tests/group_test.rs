//! Integration tests for the group store.

mod common;

use rust_decimal_macros::dec;
use tally_core::LedgerError;
use tally_core::ledger::NewTransaction;
use tally_shared::types::{GroupId, UserId};

#[tokio::test]
async fn test_add_group_does_not_add_creator_as_member() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;

    let group = ledger.groups().add_group(" trip ", a).await.unwrap();

    assert_eq!(group.name, "trip");
    assert_eq!(group.created_by, a.get());
    assert!(
        ledger
            .members()
            .get_group_members_by_group_id(GroupId::new(group.id))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_add_group_requires_creator() {
    let ledger = common::setup().await;

    let result = ledger.groups().add_group("trip", UserId::new(42)).await;

    assert!(matches!(result, Err(ref e) if e.error_code() == "USER_NOT_FOUND"));
    assert!(ledger.groups().get_all_groups().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_group_rejects_blank_name() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;

    let result = ledger.groups().add_group("   ", a).await;

    assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_update_and_query_group() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let trip = common::group_id(&ledger, "trip", a).await;

    let renamed = ledger.groups().update_group(trip, "summer trip").await.unwrap();
    assert_eq!(renamed.name, "summer trip");

    assert!(ledger.groups().group_exists(trip).await.unwrap());
    assert_eq!(ledger.groups().group_creator(trip).await.unwrap(), a);

    let missing = ledger.groups().update_group(GroupId::new(99), "x").await;
    assert!(matches!(missing, Err(ref e) if e.error_code() == "GROUP_NOT_FOUND"));
    assert!(ledger.groups().get_group(GroupId::new(99)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_groups_for_user_follows_membership() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;
    let trip = common::group_id(&ledger, "trip", a).await;
    let flat = common::group_id(&ledger, "flat", a).await;
    common::group_id(&ledger, "office", a).await;

    ledger.members().add_group_member(trip, b).await.unwrap();
    ledger.members().add_group_member(flat, b).await.unwrap();

    let groups = ledger.groups().list_groups_for_user(b).await.unwrap();
    let ids: Vec<i32> = groups.iter().map(|g| g.id).collect();
    assert_eq!(ids, vec![trip.get(), flat.get()]);

    assert!(ledger.groups().list_groups_for_user(a).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_group_cascades_memberships() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;
    let trip = common::group_id(&ledger, "trip", a).await;
    ledger.members().add_group_member(trip, b).await.unwrap();

    ledger.groups().delete_group(trip).await.unwrap();

    assert!(!ledger.groups().group_exists(trip).await.unwrap());
    assert!(!ledger.members().is_member(trip, b).await.unwrap());

    let again = ledger.groups().delete_group(trip).await;
    assert!(matches!(again, Err(ref e) if e.error_code() == "GROUP_NOT_FOUND"));
}

#[tokio::test]
async fn test_group_with_transactions_cannot_be_deleted() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;
    let trip = common::group_id(&ledger, "trip", a).await;
    ledger
        .transactions()
        .create_transaction(NewTransaction::new(a, b, dec!(10)).in_group(trip))
        .await
        .unwrap();

    let result = ledger.groups().delete_group(trip).await;

    assert!(matches!(result, Err(LedgerError::Conflict(_))));
    assert!(ledger.groups().group_exists(trip).await.unwrap());
}
