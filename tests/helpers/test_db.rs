use slawatch::infrastructure::persistence::Database;

pub async fn setup_test_db() -> Database {
    // Install drivers for AnyPool (required for tests)
    sqlx::any::install_default_drivers();

    // Use file-based SQLite for tests (unique UUID per test for parallel execution)
    use uuid::Uuid;
    let temp_file = format!("test_{}.db", Uuid::new_v4());
    let db_url = format!("sqlite://{}?mode=rwc", temp_file);

    let db = Database::connect(&db_url)
        .await
        .expect("Failed to connect to test database");

    setup_schema(&db).await;

    db
}

async fn setup_schema(db: &Database) {
    let pool = db.pool();

    sqlx::query(
        "CREATE TABLE users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL DEFAULT 'agent',
            is_active INTEGER NOT NULL DEFAULT 1,
            workload INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create users table");

    sqlx::query(
        "CREATE TABLE tickets (
            id TEXT PRIMARY KEY,
            subject TEXT NOT NULL,
            priority TEXT NOT NULL DEFAULT 'Medium',
            status TEXT NOT NULL DEFAULT 'open',
            assigned_user_id TEXT REFERENCES users(id),
            sla_due TEXT,
            responded_at TEXT,
            resolved_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create tickets table");

    sqlx::query(
        "CREATE TABLE sla_policies (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            is_active INTEGER NOT NULL DEFAULT 0,
            business_hours_mode TEXT NOT NULL DEFAULT 'always_on',
            working_days TEXT NOT NULL DEFAULT '[]',
            activated_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create sla_policies table");

    sqlx::query(
        "CREATE TABLE sla_rules (
            id TEXT PRIMARY KEY,
            policy_id TEXT NOT NULL REFERENCES sla_policies(id) ON DELETE CASCADE,
            priority TEXT NOT NULL,
            response_time_minutes INTEGER NOT NULL,
            resolution_time_hours INTEGER NOT NULL,
            escalate_at_percent INTEGER NOT NULL DEFAULT 80,
            enabled INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create sla_rules table");

    sqlx::query(
        "CREATE TABLE holidays (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            date TEXT NOT NULL,
            recurring INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create holidays table");

    sqlx::query(
        "CREATE TABLE ticket_sla_trackings (
            id TEXT PRIMARY KEY,
            ticket_id TEXT NOT NULL UNIQUE REFERENCES tickets(id) ON DELETE CASCADE,
            policy_id TEXT NOT NULL REFERENCES sla_policies(id),
            rule_id TEXT NOT NULL REFERENCES sla_rules(id),
            response_due TEXT NOT NULL,
            response_completed_at TEXT,
            response_breached INTEGER NOT NULL DEFAULT 0,
            resolution_due TEXT NOT NULL,
            resolution_completed_at TEXT,
            resolution_breached INTEGER NOT NULL DEFAULT 0,
            current_status TEXT NOT NULL DEFAULT 'compliant',
            percent_consumed REAL NOT NULL DEFAULT 0,
            started_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create ticket_sla_trackings table");

    sqlx::query(
        "CREATE TABLE sla_escalation_rules (
            id TEXT PRIMARY KEY,
            policy_id TEXT NOT NULL REFERENCES sla_policies(id) ON DELETE CASCADE,
            level INTEGER NOT NULL,
            trigger_percent INTEGER NOT NULL,
            notify_assignee INTEGER NOT NULL DEFAULT 1,
            notify_managers INTEGER NOT NULL DEFAULT 0,
            auto_reassign_role TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(policy_id, level)
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create sla_escalation_rules table");

    sqlx::query(
        "CREATE TABLE sla_escalations (
            id TEXT PRIMARY KEY,
            tracking_id TEXT NOT NULL REFERENCES ticket_sla_trackings(id) ON DELETE CASCADE,
            ticket_id TEXT NOT NULL,
            level INTEGER NOT NULL,
            trigger_percent INTEGER NOT NULL,
            percent_at_fire REAL NOT NULL,
            reassigned_to TEXT,
            notified_user_ids TEXT NOT NULL DEFAULT '[]',
            fired_at TEXT NOT NULL,
            UNIQUE(tracking_id, level)
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create sla_escalations table");

    sqlx::query(
        "CREATE TABLE ticket_events (
            id TEXT PRIMARY KEY,
            ticket_id TEXT NOT NULL,
            event_type TEXT NOT NULL,
            payload TEXT NOT NULL DEFAULT 'null',
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create ticket_events table");

    sqlx::query(
        "CREATE TABLE notifications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            link TEXT NOT NULL DEFAULT '',
            read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create notifications table");

    sqlx::query(
        "CREATE TABLE jobs (
            id TEXT PRIMARY KEY,
            job_type TEXT NOT NULL,
            payload TEXT NOT NULL DEFAULT 'null',
            status TEXT NOT NULL DEFAULT 'pending',
            run_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            attempts INTEGER NOT NULL DEFAULT 0,
            max_attempts INTEGER NOT NULL DEFAULT 3,
            last_error TEXT,
            locked_until TEXT
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create jobs table");
}
