//! Integration tests for heartbeats and role-gated rosters.

mod helpers;

use std::time::Duration as StdDuration;

use chrono::Duration;
use futures::StreamExt;

use schoolhub_core::traits::document_store::DocumentStore;
use schoolhub_core::types::clock::Clock;
use schoolhub_core::types::id::TenantId;
use schoolhub_entity::presence::PresenceSample;
use schoolhub_entity::principal::{Principal, Role};
use schoolhub_realtime::ClientInfo;

use helpers::{TestApp, settle};

async fn load_sample(app: &TestApp, principal: &Principal) -> PresenceSample {
    app.store
        .get(PresenceSample::COLLECTION, &principal.id.to_doc_id())
        .await
        .expect("store read failed")
        .expect("presence sample missing")
        .decode()
        .expect("presence sample malformed")
}

#[tokio::test(start_paused = true)]
async fn test_admin_sees_teacher_online_teacher_sees_nothing() {
    let app = TestApp::new();
    let tenant = TenantId::new();
    let admin = app.principal(Role::Admin, tenant, "Admin");
    let teacher = app.principal(Role::Teacher, tenant, "Teacher");
    let elsewhere = app.principal(Role::Teacher, TenantId::new(), "Elsewhere");

    let ctx_admin = app
        .engine
        .sign_in(admin.clone(), ClientInfo::default())
        .await
        .unwrap();
    let ctx_teacher = app
        .new_client()
        .sign_in(teacher.clone(), ClientInfo::default())
        .await
        .unwrap();
    let ctx_elsewhere = app
        .new_client()
        .sign_in(elsewhere.clone(), ClientInfo::default())
        .await
        .unwrap();
    settle().await;

    let now = app.clock.now();
    let roster = ctx_admin.roster().await;
    assert_eq!(roster.samples().len(), 2);
    assert!(roster.is_online(admin.id, now));
    assert!(roster.is_online(teacher.id, now));
    assert!(!roster.is_online(elsewhere.id, now));

    assert!(ctx_teacher.roster().await.is_empty());

    ctx_admin.sign_out().await;
    ctx_teacher.sign_out().await;
    ctx_elsewhere.sign_out().await;
}

#[tokio::test(start_paused = true)]
async fn test_signed_out_teacher_drops_offline_after_window() {
    let app = TestApp::new();
    let tenant = TenantId::new();
    let manager = app.principal(Role::Manager, tenant, "Manager");
    let teacher = app.principal(Role::Teacher, tenant, "Teacher");

    let ctx_teacher = app
        .new_client()
        .sign_in(teacher.clone(), ClientInfo::default())
        .await
        .unwrap();
    settle().await;
    ctx_teacher.sign_out().await;

    let ctx_manager = app
        .engine
        .sign_in(manager, ClientInfo::default())
        .await
        .unwrap();
    settle().await;

    app.advance(Duration::seconds(179));
    let roster = ctx_manager.roster().await;
    assert!(roster.is_online(teacher.id, app.clock.now()));

    app.advance(Duration::seconds(2));
    let roster = ctx_manager.roster().await;
    let now = app.clock.now();
    assert!(!roster.is_online(teacher.id, now));
    // The sample stays; only the derived status changes.
    assert!(roster.samples().iter().any(|s| s.principal_id == teacher.id));

    ctx_manager.sign_out().await;
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_refreshes_last_seen() {
    let app = TestApp::new();
    let teacher = app.principal(Role::Teacher, TenantId::new(), "Teacher");
    let start = app.clock.now();

    let ctx = app
        .engine
        .sign_in(teacher.clone(), ClientInfo::default())
        .await
        .unwrap();
    settle().await;
    assert_eq!(load_sample(&app, &teacher).await.last_seen_at, start);

    app.advance(Duration::seconds(60));
    tokio::time::sleep(StdDuration::from_secs(60)).await;

    let sample = load_sample(&app, &teacher).await;
    assert_eq!(sample.last_seen_at, start + Duration::seconds(60));
    assert_eq!(sample.role, Role::Teacher);
    assert_eq!(sample.display_name, "Teacher");

    ctx.sign_out().await;
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_stops_heartbeat_writes() {
    let app = TestApp::new();
    let student = app.principal(Role::Student, TenantId::new(), "Student");

    let ctx = app
        .engine
        .sign_in(student, ClientInfo::default())
        .await
        .unwrap();
    settle().await;
    ctx.sign_out().await;

    let writes = app.store.write_count();
    tokio::time::sleep(StdDuration::from_secs(300)).await;
    assert_eq!(app.store.write_count(), writes);
}

#[tokio::test(start_paused = true)]
async fn test_roster_stream_follows_new_arrivals() {
    let app = TestApp::new();
    let tenant = TenantId::new();
    let admin = app.principal(Role::Admin, tenant, "Admin");
    let student = app.principal(Role::Student, tenant, "Student");

    let ctx_admin = app
        .engine
        .sign_in(admin.clone(), ClientInfo::default())
        .await
        .unwrap();
    settle().await;

    let mut live = ctx_admin.subscribe_roster().await;
    let initial = live.next().await.unwrap();
    assert_eq!(initial.samples().len(), 1);

    let ctx_student = app
        .new_client()
        .sign_in(student.clone(), ClientInfo::default())
        .await
        .unwrap();
    let updated = live.next().await.unwrap();
    let now = app.clock.now();
    assert!(updated.is_online(student.id, now));

    let entries = updated.entries(now);
    let names: Vec<&str> = entries
        .iter()
        .map(|e| e.sample.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["Admin", "Student"]);

    // Denied viewers get one empty roster and nothing more.
    let mut denied = ctx_student.subscribe_roster().await;
    assert!(denied.next().await.unwrap().is_empty());
    assert!(denied.next().await.is_none());

    ctx_admin.sign_out().await;
    ctx_student.sign_out().await;
}
