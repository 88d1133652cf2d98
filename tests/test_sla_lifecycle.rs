mod helpers;

use chrono::{TimeZone, Utc};
use helpers::*;
use slawatch::events::SystemEvent;
use slawatch::services::tracking_service::InitializeOutcome;
use slawatch::services::WorkingCalendar;
use slawatch::models::SlaStatus;

#[tokio::test]
async fn test_initialize_creates_tracking_and_mirrors_due() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Standard").await;
    let rule = create_test_rule(&db, &policy.id, "Medium", 30, 4).await;
    let ticket = create_test_ticket(&db, "Printer on fire", "Medium").await;

    let service = build_tracking_service(&db);
    let outcome = service.initialize(&ticket.id).await.unwrap();

    let tracking = match outcome {
        InitializeOutcome::Tracked(t) => t,
        InitializeOutcome::NotApplicable => panic!("Expected tracking to start"),
    };
    assert_eq!(tracking.policy_id, policy.id);
    assert_eq!(tracking.rule_id, rule.id);
    assert_eq!(tracking.current_status, SlaStatus::Compliant);
    assert_eq!(tracking.percent_consumed, 0.0);

    // Row is queryable and the resolution due is mirrored onto the ticket
    let stored = db.get_tracking_by_ticket(&ticket.id).await.unwrap().unwrap();
    assert_eq!(stored.id, tracking.id);

    let stored_ticket = db.get_ticket(&ticket.id).await.unwrap().unwrap();
    assert_eq!(stored_ticket.sla_due.as_deref(), Some(tracking.resolution_due.as_str()));

    // Lifecycle event was appended
    let events = db.list_ticket_events(&ticket.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].event_type,
        slawatch::models::TicketEventType::SlaStarted
    );
}

#[tokio::test]
async fn test_initialize_without_active_policy_is_not_applicable() {
    let db = setup_test_db().await;

    let ticket = create_test_ticket(&db, "No SLA here", "High").await;
    let service = build_tracking_service(&db);

    let outcome = service.initialize(&ticket.id).await.unwrap();
    assert!(matches!(outcome, InitializeOutcome::NotApplicable));
    assert!(db.get_tracking_by_ticket(&ticket.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_initialize_without_matching_rule_is_not_applicable() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "High only").await;
    create_test_rule(&db, &policy.id, "High", 15, 2).await;

    // Medium ticket, no Medium rule and no Low fallback
    let ticket = create_test_ticket(&db, "Unmatched", "Medium").await;
    let service = build_tracking_service(&db);

    let outcome = service.initialize(&ticket.id).await.unwrap();
    assert!(matches!(outcome, InitializeOutcome::NotApplicable));
}

#[tokio::test]
async fn test_reinitialize_replaces_tracking_row() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Standard").await;
    create_test_rule(&db, &policy.id, "Medium", 30, 4).await;
    let ticket = create_test_ticket(&db, "Reopened", "Medium").await;

    let service = build_tracking_service(&db);
    let first = match service.initialize(&ticket.id).await.unwrap() {
        InitializeOutcome::Tracked(t) => t,
        _ => panic!("Expected tracking"),
    };
    let second = match service.initialize(&ticket.id).await.unwrap() {
        InitializeOutcome::Tracked(t) => t,
        _ => panic!("Expected tracking"),
    };
    assert_ne!(first.id, second.id);

    // Only the fresh row survives
    let stored = db.get_tracking_by_ticket(&ticket.id).await.unwrap().unwrap();
    assert_eq!(stored.id, second.id);
    assert_eq!(stored.current_status, SlaStatus::Compliant);
}

#[tokio::test]
async fn test_evaluate_marks_at_risk_and_never_moves_back() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Standard").await;
    let rule = create_test_rule(&db, &policy.id, "Medium", 30, 1).await;
    let ticket = create_test_ticket(&db, "Slipping", "Medium").await;

    // Monday 2025-03-10, pinned instants so the math is deterministic
    let started = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let response_due = Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap();
    let resolution_due = Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap();
    let tracking = insert_tracking_started_at(
        &db, &ticket.id, &policy.id, &rule.id, started, response_due, resolution_due,
    )
    .await;

    let service = build_tracking_service(&db);
    let calendar = WorkingCalendar::default();

    // 48 of 60 budget minutes consumed: 80% -> at risk
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 48, 0).unwrap();
    let eval = service
        .evaluate(&tracking, &calendar, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(eval.status, SlaStatus::AtRisk);
    assert!(eval.status_changed);
    assert!((eval.percent_consumed - 80.0).abs() < 0.01);

    // A later evaluation at a lower percent keeps the worse status
    let stored = db.get_tracking_by_ticket(&ticket.id).await.unwrap().unwrap();
    let earlier = Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap();
    let eval = service
        .evaluate(&stored, &calendar, earlier)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(eval.status, SlaStatus::AtRisk);
    assert!(!eval.status_changed);
    assert!((eval.percent_consumed - 50.0).abs() < 0.01);
}

#[tokio::test]
async fn test_evaluate_breach_sets_flags_and_clamps_percent() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Standard").await;
    let rule = create_test_rule(&db, &policy.id, "Medium", 30, 1).await;
    let ticket = create_test_ticket(&db, "Breached", "Medium").await;

    let started = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let response_due = Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap();
    let resolution_due = Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap();
    let tracking = insert_tracking_started_at(
        &db, &ticket.id, &policy.id, &rule.id, started, response_due, resolution_due,
    )
    .await;

    let service = build_tracking_service(&db);
    let calendar = WorkingCalendar::default();

    // Well past the budget: percent clamps at 100, both deadlines missed
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 11, 30, 0).unwrap();
    let eval = service
        .evaluate(&tracking, &calendar, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(eval.status, SlaStatus::Breached);
    assert_eq!(eval.percent_consumed, 100.0);

    let stored = db.get_tracking_by_ticket(&ticket.id).await.unwrap().unwrap();
    assert!(stored.response_breached);
    assert!(stored.resolution_breached);
    assert_eq!(stored.current_status, SlaStatus::Breached);

    // Status change was journaled
    let events = db.list_ticket_events(&ticket.id).await.unwrap();
    assert!(events.iter().any(|e| {
        e.event_type == slawatch::models::TicketEventType::SlaStatusChanged
    }));
}

#[tokio::test]
async fn test_evaluation_skips_sunday_minutes() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Standard").await;
    let rule = create_test_rule(&db, &policy.id, "Medium", 30, 4).await;
    let ticket = create_test_ticket(&db, "Weekend wait", "Medium").await;

    // Started Saturday 22:00; due Monday 02:00 (Sunday contributes nothing)
    let started = Utc.with_ymd_and_hms(2025, 3, 8, 22, 0, 0).unwrap();
    let response_due = Utc.with_ymd_and_hms(2025, 3, 8, 22, 30, 0).unwrap();
    let resolution_due = Utc.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
    let tracking = insert_tracking_started_at(
        &db, &ticket.id, &policy.id, &rule.id, started, response_due, resolution_due,
    )
    .await;

    let service = build_tracking_service(&db);
    let calendar = WorkingCalendar::default();

    // Sunday noon: only the Saturday-night minutes have counted (119 of 240,
    // the minute landing on Sunday midnight is non-working)
    let now = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
    let eval = service
        .evaluate(&tracking, &calendar, now)
        .await
        .unwrap()
        .unwrap();
    assert!((eval.percent_consumed - 119.0 / 240.0 * 100.0).abs() < 0.01);
    assert_eq!(eval.status, SlaStatus::Compliant);
}

#[tokio::test]
async fn test_record_first_response_is_idempotent() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Standard").await;
    let rule = create_test_rule(&db, &policy.id, "Medium", 30, 4).await;
    let ticket = create_test_ticket(&db, "Responded", "Medium").await;

    let started = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let response_due = Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap();
    let resolution_due = Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap();
    insert_tracking_started_at(
        &db, &ticket.id, &policy.id, &rule.id, started, response_due, resolution_due,
    )
    .await;

    let service = build_tracking_service(&db);

    let first_at = Utc.with_ymd_and_hms(2025, 3, 10, 9, 10, 0).unwrap().to_rfc3339();
    service.record_first_response(&ticket.id, &first_at).await.unwrap();

    let stored = db.get_tracking_by_ticket(&ticket.id).await.unwrap().unwrap();
    assert_eq!(stored.response_completed_at.as_deref(), Some(first_at.as_str()));
    assert!(!stored.response_breached);

    // Second call keeps the original instant
    let later = Utc.with_ymd_and_hms(2025, 3, 10, 11, 0, 0).unwrap().to_rfc3339();
    service.record_first_response(&ticket.id, &later).await.unwrap();
    let stored = db.get_tracking_by_ticket(&ticket.id).await.unwrap().unwrap();
    assert_eq!(stored.response_completed_at.as_deref(), Some(first_at.as_str()));
}

#[tokio::test]
async fn test_record_resolution_after_due_flags_breach() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Standard").await;
    let rule = create_test_rule(&db, &policy.id, "Medium", 30, 1).await;
    let ticket = create_test_ticket(&db, "Late fix", "Medium").await;

    let started = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let response_due = Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap();
    let resolution_due = Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap();
    insert_tracking_started_at(
        &db, &ticket.id, &policy.id, &rule.id, started, response_due, resolution_due,
    )
    .await;

    let service = build_tracking_service(&db);
    let resolved_at = Utc.with_ymd_and_hms(2025, 3, 10, 10, 45, 0).unwrap().to_rfc3339();
    service.record_resolution(&ticket.id, &resolved_at).await.unwrap();

    let stored = db.get_tracking_by_ticket(&ticket.id).await.unwrap().unwrap();
    assert_eq!(stored.resolution_completed_at.as_deref(), Some(resolved_at.as_str()));
    assert!(stored.resolution_breached);

    // Completed trackings drop out of the open set
    let open = db.list_open_trackings().await.unwrap();
    assert!(open.iter().all(|t| t.ticket_id != ticket.id));
}

#[tokio::test]
async fn test_status_change_is_published_to_event_bus() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Standard").await;
    let rule = create_test_rule(&db, &policy.id, "Medium", 30, 1).await;
    let ticket = create_test_ticket(&db, "Watched", "Medium").await;

    let started = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let response_due = Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap();
    let resolution_due = Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap();
    let tracking = insert_tracking_started_at(
        &db, &ticket.id, &policy.id, &rule.id, started, response_due, resolution_due,
    )
    .await;

    let (service, bus) = build_tracking_service_with_bus(&db);
    let mut rx = bus.subscribe();
    let calendar = WorkingCalendar::default();

    let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 48, 0).unwrap();
    service.evaluate(&tracking, &calendar, now).await.unwrap().unwrap();

    match rx.try_recv().unwrap() {
        SystemEvent::SlaStatusChanged {
            ticket_id,
            old_status,
            new_status,
            percent_consumed,
            ..
        } => {
            assert_eq!(ticket_id, ticket.id);
            assert_eq!(old_status, SlaStatus::Compliant);
            assert_eq!(new_status, SlaStatus::AtRisk);
            assert!((percent_consumed - 80.0).abs() < 0.01);
        }
        other => panic!("Unexpected event: {:?}", other),
    }

    // Re-evaluating at the same percent keeps the status and stays quiet
    let stored = db.get_tracking_by_ticket(&ticket.id).await.unwrap().unwrap();
    service.evaluate(&stored, &calendar, now).await.unwrap().unwrap();
    assert!(rx.try_recv().is_err());
}
