//! Update coordinator tests

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::TryRecvError;

use skybridge::auth::store::TokenStore;
use skybridge::auth::tokens::TokenPair;
use skybridge::bus::dispatcher::Dispatcher;
use skybridge::poll::updater::{UpdateOutcome, Updater, MIN_TIME_BETWEEN_UPDATES};
use skybridge::session::Session;

use common::{controller_fixture, events_snapshot, new_event_log, MemoryTokenStore, MockSession};

fn updater_parts(
    events: &common::EventLog,
) -> (Arc<MockSession>, Arc<MemoryTokenStore>, Dispatcher) {
    let session = Arc::new(
        MockSession::new(events.clone()).with_tokens(TokenPair::new("at-old", "rt-old")),
    );
    session.set_controllers(vec![controller_fixture()]);
    let store = Arc::new(MemoryTokenStore::new(events.clone()));
    let dispatcher = Dispatcher::default();
    (session, store, dispatcher)
}

#[test]
fn test_default_throttle_window() {
    assert_eq!(MIN_TIME_BETWEEN_UPDATES, Duration::from_secs(30));
}

#[tokio::test]
async fn test_cycle_refreshes_persists_fetches_then_broadcasts() {
    let events = new_event_log();
    let (session, store, dispatcher) = updater_parts(&events);
    session.set_expired(true);

    let mut rx = dispatcher.subscribe();
    let updater = Updater::new(session.clone(), store.clone(), dispatcher);

    let outcome = updater.update_data().await;
    assert_eq!(outcome, UpdateOutcome::Updated);

    // Refresh, persist and fetch in that order
    assert_eq!(events_snapshot(&events), vec!["refresh", "persist", "fetch"]);

    // The refreshed pair replaced both halves everywhere
    let fresh = TokenPair::new("at-r1", "rt-r1");
    assert_eq!(session.token_data().await, fresh);
    assert_eq!(store.saved(), Some(fresh));

    // The signal went out after the fetch
    assert!(rx.try_recv().is_ok());
}

#[tokio::test]
async fn test_fresh_tokens_skip_the_refresh() {
    let events = new_event_log();
    let (session, store, dispatcher) = updater_parts(&events);
    session.set_expired(false);

    let updater = Updater::new(session, store.clone(), dispatcher);

    assert_eq!(updater.update_data().await, UpdateOutcome::Updated);
    assert_eq!(events_snapshot(&events), vec!["fetch"]);
    assert_eq!(store.saved(), None);
}

#[tokio::test]
async fn test_second_call_inside_window_is_a_no_op() {
    let events = new_event_log();
    let (session, store, dispatcher) = updater_parts(&events);

    let mut rx = dispatcher.subscribe();
    let updater = Updater::new(session, store, dispatcher)
        .with_min_interval(Duration::from_millis(200));

    assert_eq!(updater.update_data().await, UpdateOutcome::Updated);
    assert_eq!(updater.update_data().await, UpdateOutcome::Skipped);

    // Only one cycle ran, only one signal went out
    assert_eq!(events_snapshot(&events), vec!["fetch"]);
    assert!(rx.try_recv().is_ok());
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    // Past the window the next call runs again
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(updater.update_data().await, UpdateOutcome::Updated);
    assert_eq!(events_snapshot(&events), vec!["fetch", "fetch"]);
}

#[tokio::test]
async fn test_failed_fetch_broadcasts_nothing() {
    let events = new_event_log();
    let (session, store, dispatcher) = updater_parts(&events);
    session.set_fail_update(true);

    let mut rx = dispatcher.subscribe();
    let updater =
        Updater::new(session.clone(), store, dispatcher).with_min_interval(Duration::ZERO);

    assert_eq!(updater.update_data().await, UpdateOutcome::Failed);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(updater.consecutive_failures().await, 1);

    assert_eq!(updater.update_data().await, UpdateOutcome::Failed);
    assert_eq!(updater.consecutive_failures().await, 2);

    // Recovery broadcasts again and clears the streak
    session.set_fail_update(false);
    assert_eq!(updater.update_data().await, UpdateOutcome::Updated);
    assert!(rx.try_recv().is_ok());
    assert_eq!(updater.consecutive_failures().await, 0);
}

#[tokio::test]
async fn test_failed_refresh_still_attempts_the_fetch() {
    let events = new_event_log();
    let (session, store, dispatcher) = updater_parts(&events);
    session.set_expired(true);
    session.set_fail_refresh(true);
    session.set_fail_update(true);

    let mut rx = dispatcher.subscribe();
    let updater = Updater::new(session, store.clone(), dispatcher);

    assert_eq!(updater.update_data().await, UpdateOutcome::Failed);

    // No persist without a fresh pair, no signal without a fetch
    assert_eq!(events_snapshot(&events), vec!["refresh", "fetch"]);
    assert_eq!(store.saved(), None);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_failed_persist_does_not_abort_the_cycle() {
    let events = new_event_log();
    let (session, store, dispatcher) = updater_parts(&events);
    session.set_expired(true);
    store.set_fail_save(true);

    let mut rx = dispatcher.subscribe();
    let updater = Updater::new(session.clone(), store.clone(), dispatcher);

    // The cycle completes on in-memory tokens alone
    assert_eq!(updater.update_data().await, UpdateOutcome::Updated);
    assert_eq!(events_snapshot(&events), vec!["refresh", "persist", "fetch"]);
    assert_eq!(store.saved(), None);
    assert_eq!(session.token_data().await, TokenPair::new("at-r1", "rt-r1"));
    assert!(rx.try_recv().is_ok());
}

#[tokio::test]
async fn test_concurrent_calls_run_exactly_one_cycle() {
    let events = new_event_log();
    let (session, store, dispatcher) = updater_parts(&events);

    let updater = Arc::new(Updater::new(session, store, dispatcher));

    let mut handles = Vec::new();
    for _ in 0..5 {
        let updater = updater.clone();
        handles.push(tokio::spawn(async move { updater.update_data().await }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    // One winner, the rest landed inside its window
    let updated = outcomes.iter().filter(|o| **o == UpdateOutcome::Updated).count();
    let skipped = outcomes.iter().filter(|o| **o == UpdateOutcome::Skipped).count();
    assert_eq!(updated, 1);
    assert_eq!(skipped, 4);
    assert_eq!(events_snapshot(&events), vec!["fetch"]);
}

#[tokio::test]
async fn test_restored_pair_is_refreshed_on_first_cycle() {
    let events = new_event_log();
    let session = Arc::new(MockSession::new(events.clone()));
    let store = Arc::new(
        MemoryTokenStore::new(events.clone()).with_saved(TokenPair::new("at-old", "rt-old")),
    );
    let dispatcher = Dispatcher::default();

    // Startup path: restore the pair, treat its age as unknown
    let restored = store.load().await.unwrap().unwrap();
    session.load_token_data(&restored).await;
    session.set_expired(true);

    let updater = Updater::new(session.clone(), store.clone(), dispatcher);
    assert_eq!(updater.update_data().await, UpdateOutcome::Updated);

    // Both the session and the store now hold the replacement pair
    let fresh = TokenPair::new("at-r1", "rt-r1");
    assert_eq!(session.token_data().await, fresh);
    assert_eq!(store.saved(), Some(fresh));
    assert_eq!(events_snapshot(&events), vec!["refresh", "persist", "fetch"]);
}

#[tokio::test]
async fn test_every_successful_cycle_reaches_every_subscriber() {
    let events = new_event_log();
    let (session, store, dispatcher) = updater_parts(&events);

    let mut rx_a = dispatcher.subscribe();
    let mut rx_b = dispatcher.subscribe();
    let updater = Updater::new(session, store, dispatcher).with_min_interval(Duration::ZERO);

    for _ in 0..3 {
        assert_eq!(updater.update_data().await, UpdateOutcome::Updated);
    }

    for rx in [&mut rx_a, &mut rx_b] {
        for _ in 0..3 {
            assert!(rx.try_recv().is_ok());
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
}
