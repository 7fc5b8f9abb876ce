//! Integration tests for the request lifecycle and its notifications.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal_macros::dec;
use tally_core::request::{NewRequest, RequestStatus};
use tally_core::{LedgerError, Reference};
use tally_db::entities::sea_orm_active_enums::RequestStatus as StoredStatus;
use tally_shared::types::{GroupId, RequestId, UserId};
use tally_shared::{Notifier, NotifyError};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Sent {
    to: String,
    subject: String,
    body: String,
}

/// Forwards every message to a channel.
struct RecordingNotifier {
    tx: mpsc::UnboundedSender<Sent>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.tx
            .send(Sent {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            })
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}

/// Always fails.
struct BrokenNotifier;

#[async_trait]
impl Notifier for BrokenNotifier {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("smtp down".to_string()))
    }
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Sent>) -> Sent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("notification not delivered in time")
        .expect("notifier dropped")
}

#[tokio::test]
async fn test_add_and_answer_request_notifies_counterparty() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ledger = common::setup_with(Arc::new(RecordingNotifier { tx })).await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;

    let request = ledger
        .add_request(NewRequest::new(a, b, dec!(42.5)))
        .await
        .unwrap();
    assert_eq!(request.status, StoredStatus::Pending);

    assert_eq!(
        next(&mut rx).await,
        Sent {
            to: "b@x.com".to_string(),
            subject: "Request Received".to_string(),
            body: "You have received a request from A for an amount of 42.50".to_string(),
        }
    );

    let answered = ledger
        .update_request_status(RequestId::new(request.id), RequestStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(answered.status, StoredStatus::Accepted);

    assert_eq!(
        next(&mut rx).await,
        Sent {
            to: "a@x.com".to_string(),
            subject: "Request Updated".to_string(),
            body: "Your request to B for an amount of 42.50 has been accepted".to_string(),
        }
    );
}

#[tokio::test]
async fn test_flush_waits_for_pending_notifications() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ledger = common::setup_with(Arc::new(RecordingNotifier { tx })).await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;

    ledger
        .add_request(NewRequest::new(a, b, dec!(5)))
        .await
        .unwrap();
    ledger
        .add_request(NewRequest::new(b, a, dec!(7)))
        .await
        .unwrap();
    ledger.flush_notifications().await;

    let first = rx.try_recv().expect("first notification delivered");
    let second = rx.try_recv().expect("second notification delivered");
    let mut recipients = vec![first.to, second.to];
    recipients.sort();
    assert_eq!(recipients, vec!["a@x.com".to_string(), "b@x.com".to_string()]);
}

#[tokio::test]
async fn test_notification_failure_keeps_request() {
    let ledger = common::setup_with(Arc::new(BrokenNotifier)).await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;

    let request = ledger
        .add_request(NewRequest::new(a, b, dec!(10)))
        .await
        .unwrap();

    let stored = ledger
        .requests()
        .get_request_by_id(RequestId::new(request.id))
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_invalid_request_rejected_without_notification() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ledger = common::setup_with(Arc::new(RecordingNotifier { tx })).await;
    let a = common::user_id(&ledger, "a@x.com").await;

    let zero = ledger
        .add_request(NewRequest::new(a, UserId::new(2), dec!(0)))
        .await;
    assert!(matches!(zero, Err(LedgerError::InvalidArgument(_))));

    let no_receiver = ledger
        .add_request(NewRequest::new(a, UserId::new(404), dec!(5)))
        .await;
    assert!(matches!(no_receiver, Err(ref e) if e.error_code() == "USER_NOT_FOUND"));

    let no_group = ledger
        .add_request(NewRequest::new(a, a, dec!(5)).in_group(GroupId::new(404)))
        .await;
    assert!(matches!(no_group, Err(ref e) if e.error_code() == "GROUP_NOT_FOUND"));

    drop(ledger);
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_terminal_requests_cannot_change() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;
    let request = ledger
        .add_request(NewRequest::new(a, b, dec!(10)))
        .await
        .unwrap();
    let id = RequestId::new(request.id);

    ledger
        .update_request_status(id, RequestStatus::Declined)
        .await
        .unwrap();

    let again = ledger.update_request_status(id, RequestStatus::Accepted).await;
    assert!(matches!(
        again,
        Err(LedgerError::InvalidTransition { entity: "request", .. })
    ));

    let missing = ledger
        .update_request_status(RequestId::new(404), RequestStatus::Accepted)
        .await;
    assert!(matches!(
        missing,
        Err(LedgerError::ReferenceNotFound(Reference::Request(_)))
    ));
}

#[tokio::test]
async fn test_request_listings_and_delete() {
    let ledger = common::setup().await;
    let a = common::user_id(&ledger, "a@x.com").await;
    let b = common::user_id(&ledger, "b@x.com").await;
    let trip = common::group_id(&ledger, "trip", a).await;

    let r1 = ledger
        .add_request(NewRequest::new(a, b, dec!(10)).in_group(trip))
        .await
        .unwrap();
    let r2 = ledger
        .add_request(NewRequest::new(b, a, dec!(20)))
        .await
        .unwrap();

    let received: Vec<i32> = ledger
        .requests()
        .get_requests_by_receiver(b)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(received, vec![r1.id]);

    let sent: Vec<i32> = ledger
        .requests()
        .get_requests_by_sender(b)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(sent, vec![r2.id]);

    assert_eq!(ledger.requests().get_requests_by_group(trip).await.unwrap().len(), 1);

    let unknown = ledger.requests().get_requests_by_group(GroupId::new(404)).await;
    assert!(matches!(unknown, Err(ref e) if e.error_code() == "GROUP_NOT_FOUND"));

    ledger.requests().delete_request(RequestId::new(r1.id)).await.unwrap();
    assert!(ledger.requests().get_requests_by_receiver(b).await.unwrap().is_empty());

    let again = ledger.requests().delete_request(RequestId::new(r1.id)).await;
    assert!(matches!(again, Err(ref e) if e.error_code() == "REQUEST_NOT_FOUND"));
}
