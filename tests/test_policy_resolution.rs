mod helpers;

use helpers::*;

#[tokio::test]
async fn test_priority_label_is_normalized_before_lookup() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Standard").await;
    let critical = create_test_rule(&db, &policy.id, "Critical", 10, 1).await;

    let service = build_tracking_service(&db);
    let rule = service
        .resolver()
        .resolve_rule(&policy.id, "CRITICAL")
        .await
        .unwrap()
        .expect("Expected the Critical rule");
    assert_eq!(rule.id, critical.id);
}

#[tokio::test]
async fn test_normal_is_a_synonym_for_medium() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Standard").await;
    let medium = create_test_rule(&db, &policy.id, "Medium", 30, 4).await;

    let service = build_tracking_service(&db);
    let rule = service
        .resolver()
        .resolve_rule(&policy.id, "normal")
        .await
        .unwrap()
        .expect("Expected the Medium rule");
    assert_eq!(rule.id, medium.id);
}

#[tokio::test]
async fn test_lowercase_stored_labels_still_match() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Legacy labels").await;
    let high = create_test_rule(&db, &policy.id, "high", 15, 2).await;

    let service = build_tracking_service(&db);
    let rule = service
        .resolver()
        .resolve_rule(&policy.id, "High")
        .await
        .unwrap()
        .expect("Expected the lowercase high rule");
    assert_eq!(rule.id, high.id);
}

#[tokio::test]
async fn test_unknown_priority_falls_back_to_low() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Standard").await;
    let low = create_test_rule(&db, &policy.id, "Low", 60, 8).await;

    let service = build_tracking_service(&db);
    let rule = service
        .resolver()
        .resolve_rule(&policy.id, "urgent")
        .await
        .unwrap()
        .expect("Expected the Low fallback");
    assert_eq!(rule.id, low.id);
}

#[tokio::test]
async fn test_no_rule_at_all_resolves_to_none() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Empty").await;
    let service = build_tracking_service(&db);
    let rule = service
        .resolver()
        .resolve_rule(&policy.id, "High")
        .await
        .unwrap();
    assert!(rule.is_none());
}

#[tokio::test]
async fn test_disabled_rules_are_ignored() {
    let db = setup_test_db().await;

    let policy = create_test_policy(&db, "Disabled").await;
    let mut rule = slawatch::models::SlaRule::new(policy.id.clone(), "High".to_string(), 15, 2, 80);
    rule.enabled = false;
    db.create_sla_rule(&rule).await.unwrap();

    let service = build_tracking_service(&db);
    let resolved = service
        .resolver()
        .resolve_rule(&policy.id, "High")
        .await
        .unwrap();
    assert!(resolved.is_none());
}

#[tokio::test]
async fn test_most_recently_activated_policy_wins() {
    let db = setup_test_db().await;

    let older = create_test_policy(&db, "Older").await;
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let newer = create_test_policy(&db, "Newer").await;

    let service = build_tracking_service(&db);
    let active = service
        .resolver()
        .active_policy()
        .await
        .unwrap()
        .expect("Expected an active policy");
    assert_eq!(active.id, newer.id);

    // Deactivating the newer one falls back to the older
    db.set_sla_policy_active(&newer.id, false).await.unwrap();
    let active = service
        .resolver()
        .active_policy()
        .await
        .unwrap()
        .expect("Expected an active policy");
    assert_eq!(active.id, older.id);
}
