//! Tests for API request/response models

use std::sync::Arc;

use chrono::{DateTime, Utc};
use prestoposti::core::{
    NullNotifier, PartyId, PartyState, Waitlist, WaitlistError, WaitlistEvent, WaitlistLimits,
};
use prestoposti::infra::store::InMemoryPartyStore;
use prestoposti::runtime::api::health;
use prestoposti::runtime::{
    check_in_party, join_party, queue_snapshot, tick_queue, CheckInResponse, JoinRequest,
    QueueSnapshot, WaitlistService,
};
use prestoposti::util::ManualClock;
use serde_json::json;

fn service() -> WaitlistService {
    let start = DateTime::<Utc>::from_timestamp(1_714_590_000, 0).unwrap();
    let waitlist = Waitlist::new(WaitlistLimits::default(), Arc::new(InMemoryPartyStore::new()))
        .with_clock(Arc::new(ManualClock::new(start)));
    WaitlistService::new(Arc::new(waitlist), Arc::new(NullNotifier))
}

#[test]
fn test_join_request_wire_format() {
    let req: JoinRequest =
        serde_json::from_value(json!({ "name": "Rossi", "partySize": 4 })).unwrap();
    assert_eq!(req.name, "Rossi");
    assert_eq!(req.party_size, 4);
    assert!(req.validate(10).is_ok());
}

#[test]
fn test_join_request_validation() {
    let blank = JoinRequest {
        name: "   ".to_string(),
        party_size: 2,
    };
    assert!(matches!(blank.validate(10), Err(WaitlistError::Validation(_))));

    let too_big = JoinRequest {
        name: "Rossi".to_string(),
        party_size: 11,
    };
    assert!(too_big.validate(10).is_err());

    let empty = JoinRequest {
        name: "Rossi".to_string(),
        party_size: 0,
    };
    assert!(empty.validate(10).is_err());
}

#[test]
fn test_event_wire_format() {
    let event = WaitlistEvent::Eligibility {
        party_size: 3,
        eligible: true,
    };
    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        json!({ "type": "eligibility", "partySize": 3, "eligible": true })
    );

    let at = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
    let checkout = serde_json::to_value(WaitlistEvent::CheckOut { check_out_date: at }).unwrap();
    assert_eq!(checkout["type"], "checkout");
    assert!(checkout.get("checkOutDate").is_some());
}

#[test]
fn test_health() {
    assert!(health().ok);
}

#[tokio::test]
async fn test_join_check_in_and_tick_flow() {
    let service = service();

    let joined = join_party(
        &service,
        JoinRequest {
            name: "Rossi".to_string(),
            party_size: 4,
        },
    )
    .await
    .unwrap();
    assert_eq!(joined.eta_ms, 12_000);

    let body = serde_json::to_value(&joined).unwrap();
    assert_eq!(body["etaMs"], 12_000);

    let tick = tick_queue(&service).await.unwrap();
    assert_eq!(tick.eligible, vec![joined.id.clone()]);
    assert!(tick.checked_out.is_empty());

    match check_in_party(&service, &joined.id).await.unwrap() {
        CheckInResponse::CheckedIn { party } => {
            assert_eq!(party.state, PartyState::Active);
            assert!(party.check_in_date.is_some());
        }
        CheckInResponse::Ineligible => panic!("expected check-in"),
    }

    assert_eq!(
        queue_snapshot(&service).await.unwrap(),
        QueueSnapshot {
            capacity: 10,
            occupancy: 4,
            waiting: 0,
            active: 1,
            done: 0,
        }
    );
}

#[tokio::test]
async fn test_join_party_rejects_before_engine() {
    let service = service();
    let result = join_party(
        &service,
        JoinRequest {
            name: String::new(),
            party_size: 2,
        },
    )
    .await;
    assert!(matches!(result, Err(WaitlistError::Validation(_))));
    assert!(service.list_by_state(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_check_in_unknown_party_is_ineligible() {
    let service = service();
    let response = check_in_party(&service, &PartyId::from("missing"))
        .await
        .unwrap();
    assert_eq!(response, CheckInResponse::Ineligible);
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "status": "ineligible" })
    );
}

#[tokio::test]
async fn test_snapshot_occupancy_matches_listed_active_parties() {
    let service = service();
    let waitlist = service.waitlist();
    waitlist.seed("Seated", 3, PartyState::Active).await.unwrap();
    waitlist.seed("Also seated", 4, PartyState::Active).await.unwrap();
    waitlist.seed("Gone", 5, PartyState::Done).await.unwrap();
    waitlist.seed("Queued", 2, PartyState::Waiting).await.unwrap();

    let snapshot = queue_snapshot(&service).await.unwrap();
    let active: u32 = service
        .list_by_state(Some(PartyState::Active))
        .await
        .unwrap()
        .iter()
        .map(|p| p.party_size)
        .sum();
    assert_eq!(snapshot.occupancy, active);
    assert_eq!(snapshot.occupancy, waitlist.occupancy().await.unwrap());
    assert_eq!((snapshot.waiting, snapshot.active, snapshot.done), (1, 2, 1));
}
