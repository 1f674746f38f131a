use chrono::{Duration as ChronoDuration, Utc};
use marquee_booking::{InMemoryLedger, LogNotifier, QueryFacade, ReservationService, RetryPolicy};
use marquee_catalog::InMemoryCatalog;
use marquee_core::repository::{CatalogRepository, ReservationLedger};
use marquee_core::{BookingError, SeatId, SeatInventory, Showtime};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct Harness {
    service: Arc<ReservationService>,
    query: QueryFacade,
    ledger: Arc<InMemoryLedger>,
}

async fn harness(showtimes: &[(Uuid, u32)]) -> Harness {
    let catalog = Arc::new(InMemoryCatalog::new());
    let rows: Vec<Showtime> = showtimes
        .iter()
        .map(|&(id, capacity)| Showtime {
            id,
            movie_id: Uuid::new_v4(),
            theater_id: Uuid::new_v4(),
            starts_at: Utc::now() + ChronoDuration::days(1),
            seats: SeatInventory::contiguous(capacity),
        })
        .collect();
    catalog.create_showtimes(&rows).await.unwrap();

    let ledger = Arc::new(InMemoryLedger::new());
    let policy = RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(10),
        lock_timeout: Duration::from_secs(5),
    };
    let service = Arc::new(ReservationService::new(
        catalog.clone(),
        ledger.clone(),
        Arc::new(LogNotifier),
        policy,
    ));
    let query = QueryFacade::new(catalog, ledger.clone());
    Harness { service, query, ledger }
}

fn seats(ids: &[u32]) -> Vec<SeatId> {
    ids.iter().copied().map(SeatId).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_requests_exactly_one_wins() {
    for _ in 0..20 {
        let showtime = Uuid::new_v4();
        let h = harness(&[(showtime, 3)]).await;

        let a = {
            let service = h.service.clone();
            tokio::spawn(async move { service.reserve(Uuid::new_v4(), showtime, &seats(&[1, 2])).await })
        };
        let b = {
            let service = h.service.clone();
            tokio::spawn(async move { service.reserve(Uuid::new_v4(), showtime, &seats(&[2, 3])).await })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        let available = h.query.available_seats(showtime).await.unwrap();
        match (a, b) {
            (Ok(_), Err(BookingError::SeatUnavailable { seat })) => {
                assert_eq!(seat, SeatId(2));
                assert_eq!(available, seats(&[3]));
            }
            (Err(BookingError::SeatUnavailable { seat }), Ok(_)) => {
                assert_eq!(seat, SeatId(2));
                assert_eq!(available, seats(&[1]));
            }
            other => panic!("expected exactly one winner, got {:?}", other),
        }
        assert_eq!(h.ledger.len().await, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_last_seat_goes_to_one_of_many() {
    let showtime = Uuid::new_v4();
    let h = harness(&[(showtime, 1)]).await;

    let mut handles = Vec::new();
    for _ in 0..100 {
        let service = h.service.clone();
        handles.push(tokio::spawn(async move {
            service.reserve(Uuid::new_v4(), showtime, &seats(&[1])).await
        }));
    }

    let mut won = 0;
    let mut lost = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(BookingError::SeatUnavailable { seat: SeatId(1) }) => lost += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(won, 1);
    assert_eq!(lost, 99);
    assert!(h.query.available_seats(showtime).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_random_contention_keeps_holds_disjoint_and_conserves_seats() {
    let capacity = 40;
    let showtime = Uuid::new_v4();
    let h = harness(&[(showtime, capacity)]).await;

    let mut handles = Vec::new();
    for i in 0..200u32 {
        let service = h.service.clone();
        // Overlapping windows of 1-3 seats sliding across the roster
        let start = (i * 7) % capacity + 1;
        let len = i % 3 + 1;
        let request: Vec<SeatId> = (start..start + len)
            .filter(|s| *s <= capacity)
            .map(SeatId)
            .collect();
        handles.push(tokio::spawn(async move {
            service.reserve(Uuid::new_v4(), showtime, &request).await
        }));
    }

    let mut winners = Vec::new();
    for handle in handles {
        if let Ok(reservation) = handle.await.unwrap() {
            winners.push(reservation);
        }
    }

    let mut union = BTreeSet::new();
    for reservation in &winners {
        for seat in &reservation.reserved_seats {
            assert!(union.insert(*seat), "seat {} double-booked", seat);
        }
    }

    let active = h.ledger.active_seats_for(showtime).await.unwrap();
    assert_eq!(active, union);

    let available = h.query.available_seats(showtime).await.unwrap();
    assert_eq!(available.len() + union.len(), capacity as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_busy_showtime_does_not_block_others() {
    let busy = Uuid::new_v4();
    let idle = Uuid::new_v4();
    let h = harness(&[(busy, 5), (idle, 5)]).await;

    let _held = h
        .service
        .locks()
        .acquire(busy, Duration::from_secs(1))
        .await
        .unwrap();

    let reservation = tokio::time::timeout(
        Duration::from_millis(500),
        h.service.reserve(Uuid::new_v4(), idle, &seats(&[1])),
    )
    .await
    .expect("reserve on an unrelated showtime should not wait")
    .unwrap();

    assert_eq!(reservation.showtime_id, idle);
}
