//! Integration tests for the live toast feed and the unread inbox.

mod helpers;

use chrono::Duration;
use serde_json::json;

use schoolhub_core::types::clock::Clock;
use schoolhub_core::types::id::TenantId;
use schoolhub_entity::notification::{NotificationEvent, ReadStatus};
use schoolhub_entity::principal::Role;
use schoolhub_realtime::ClientInfo;
use schoolhub_realtime::notification::ToastPhase;

use helpers::{TestApp, settle};

#[tokio::test(start_paused = true)]
async fn test_teacher_sees_new_profs_event_exactly_once() {
    let app = TestApp::new();
    let tenant = TenantId::new();
    let alice = app.principal(Role::Teacher, tenant, "Alice");
    let bob = app.principal(Role::Teacher, tenant, "Bob");

    // t0 - 10s: history that must never toast.
    let old = app.post_event(&bob, "profs", "yesterday's minutes").await;
    app.advance(Duration::seconds(10));

    // t0: both sign in from their own browsers.
    let ctx_alice = app
        .engine
        .sign_in(alice.clone(), ClientInfo::default())
        .await
        .unwrap();
    let ctx_bob = app
        .new_client()
        .sign_in(bob.clone(), ClientInfo::default())
        .await
        .unwrap();
    settle().await;
    assert!(ctx_alice.toasts().is_empty());

    // t0 + 5s: Bob posts to teachers.
    app.advance(Duration::seconds(5));
    let fresh = app.post_event(&bob, "profs", "staff meeting at 4").await;
    settle().await;

    let toasts = ctx_alice.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].id(), fresh);
    assert_ne!(toasts[0].id(), old);
    assert!(ctx_bob.toasts().is_empty());

    // Any later change re-delivers the same recency window.
    app.advance(Duration::seconds(1));
    app.post_event(&bob, "eleves", "homework due").await;
    settle().await;
    assert_eq!(ctx_alice.toasts().len(), 1);

    ctx_alice.sign_out().await;
    ctx_bob.sign_out().await;
}

#[tokio::test(start_paused = true)]
async fn test_direct_and_class_audiences() {
    let app = TestApp::new();
    let tenant = TenantId::new();
    let admin = app.principal(Role::Admin, tenant, "Admin");
    let guardian = app.principal(Role::Guardian, tenant, "Parent");
    let teacher = app.principal(Role::Teacher, tenant, "Teacher");

    let ctx_guardian = app
        .engine
        .sign_in(guardian.clone(), ClientInfo::default())
        .await
        .unwrap();
    let ctx_teacher = app
        .new_client()
        .sign_in(teacher.clone(), ClientInfo::default())
        .await
        .unwrap();
    settle().await;

    app.advance(Duration::seconds(1));
    let direct = app
        .post_event(&admin, &guardian.id.to_string(), "please call the office")
        .await;
    app.advance(Duration::seconds(1));
    let everyone = app.post_event(&admin, "everyone", "school closed friday").await;
    app.advance(Duration::seconds(1));
    app.post_event(&admin, "cafeteria", "unknown audience").await;
    settle().await;

    let guardian_ids: Vec<_> = ctx_guardian.toasts().iter().map(|t| t.id()).collect();
    assert_eq!(guardian_ids, vec![everyone, direct]);
    let teacher_ids: Vec<_> = ctx_teacher.toasts().iter().map(|t| t.id()).collect();
    assert_eq!(teacher_ids, vec![everyone]);
}

#[tokio::test(start_paused = true)]
async fn test_other_tenant_events_never_toast() {
    let app = TestApp::new();
    let viewer = app.principal(Role::Teacher, TenantId::new(), "Viewer");
    let outsider = app.principal(Role::Admin, TenantId::new(), "Outsider");

    let ctx = app
        .engine
        .sign_in(viewer, ClientInfo::default())
        .await
        .unwrap();
    app.advance(Duration::seconds(1));
    app.post_event(&outsider, "everyone", "not for you").await;
    settle().await;

    assert!(ctx.toasts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_toasts_expire_and_dismiss() {
    let app = TestApp::new();
    let tenant = TenantId::new();
    let viewer = app.principal(Role::Student, tenant, "Viewer");
    let admin = app.principal(Role::Admin, tenant, "Admin");

    let ctx = app
        .engine
        .sign_in(viewer, ClientInfo::default())
        .await
        .unwrap();
    app.advance(Duration::seconds(1));
    let first = app.post_event(&admin, "eleves", "first").await;
    app.advance(Duration::seconds(1));
    let second = app.post_event(&admin, "eleves", "second").await;
    settle().await;
    assert_eq!(ctx.toasts().len(), 2);

    assert!(ctx.dismiss_toast(first));
    assert!(!ctx.dismiss_toast(first));
    let leaving = ctx
        .toasts()
        .into_iter()
        .find(|t| t.id() == first)
        .unwrap();
    assert_eq!(leaving.phase(app.clock.now()), ToastPhase::Leaving);

    app.advance(Duration::milliseconds(400));
    settle().await;
    let remaining: Vec<_> = ctx.toasts().iter().map(|t| t.id()).collect();
    assert_eq!(remaining, vec![second]);

    app.advance(Duration::seconds(7));
    settle().await;
    assert!(ctx.toasts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_queue_keeps_five_newest() {
    let app = TestApp::new();
    let tenant = TenantId::new();
    let viewer = app.principal(Role::Teacher, tenant, "Viewer");
    let admin = app.principal(Role::Admin, tenant, "Admin");

    let ctx = app
        .engine
        .sign_in(viewer, ClientInfo::default())
        .await
        .unwrap();

    let mut posted = Vec::new();
    for i in 0..7 {
        app.advance(Duration::milliseconds(100));
        posted.push(app.post_event(&admin, "everyone", &format!("event {i}")).await);
    }
    settle().await;

    let shown: Vec<_> = ctx.toasts().iter().map(|t| t.id()).collect();
    let expected: Vec<_> = posted.iter().rev().take(5).copied().collect();
    assert_eq!(shown, expected);
}

#[tokio::test(start_paused = true)]
async fn test_feed_skips_malformed_and_survives_outage() {
    let app = TestApp::new();
    let tenant = TenantId::new();
    let viewer = app.principal(Role::Teacher, tenant, "Viewer");
    let admin = app.principal(Role::Admin, tenant, "Admin");

    let ctx = app
        .engine
        .sign_in(viewer, ClientInfo::default())
        .await
        .unwrap();
    settle().await;

    app.advance(Duration::seconds(1));
    let _: uuid::Uuid = app
        .create(
            NotificationEvent::COLLECTION,
            json!({"tenantId": tenant, "body": "missing author and audience"}),
        )
        .await;
    settle().await;
    assert!(ctx.toasts().is_empty());

    app.store.set_available(false);
    settle().await;
    app.store.set_available(true);
    settle().await;

    app.advance(Duration::seconds(1));
    let after = app.post_event(&admin, "everyone", "back online").await;
    settle().await;
    let shown: Vec<_> = ctx.toasts().iter().map(|t| t.id()).collect();
    assert_eq!(shown, vec![after]);
}

#[tokio::test(start_paused = true)]
async fn test_unread_inbox_tracks_pushes_and_mark_all() {
    let app = TestApp::new();
    let tenant = TenantId::new();
    let parent = app.principal(Role::Guardian, tenant, "Parent");
    let other = app.principal(Role::Guardian, tenant, "Other");

    app.deliver_notification(&parent, "Report card").await;
    app.advance(Duration::seconds(1));
    app.deliver_notification(&parent, "Trip form").await;
    app.deliver_notification(&other, "Not yours").await;

    let ctx = app
        .engine
        .sign_in(parent.clone(), ClientInfo::default())
        .await
        .unwrap();
    settle().await;

    let snapshot = ctx.unread().snapshot();
    assert_eq!(snapshot.items.len(), 2);
    assert_eq!(snapshot.unread_count, 2);
    assert_eq!(snapshot.items[0].payload.title, "Trip form");

    assert_eq!(ctx.unread().mark_all_read().await, 2);
    assert_eq!(ctx.unread().snapshot().unread_count, 0);

    app.advance(Duration::seconds(1));
    app.deliver_notification(&parent, "Late arrival").await;
    settle().await;

    let snapshot = ctx.unread().snapshot();
    assert_eq!(snapshot.items.len(), 3);
    assert_eq!(snapshot.unread_count, 1);
    assert_eq!(snapshot.items[0].status, ReadStatus::Unread);
    assert!(snapshot.items[1..].iter().all(|n| n.status == ReadStatus::Read));

    ctx.sign_out().await;
}

#[tokio::test(start_paused = true)]
async fn test_feed_rearms_on_every_sign_in() {
    let app = TestApp::new();
    let tenant = TenantId::new();
    let alice = app.principal(Role::Teacher, tenant, "Alice");
    let bob = app.principal(Role::Teacher, tenant, "Bob");
    let carol = app.principal(Role::Teacher, tenant, "Carol");

    let ctx = app
        .engine
        .sign_in(alice.clone(), ClientInfo::default())
        .await
        .unwrap();
    settle().await;
    app.advance(Duration::seconds(1));
    let during = app.post_event(&bob, "profs", "first session").await;
    settle().await;
    let shown: Vec<_> = ctx.toasts().iter().map(|t| t.id()).collect();
    assert_eq!(shown, vec![during]);
    ctx.sign_out().await;

    // Posted while nobody was signed in: history for the next session.
    app.advance(Duration::seconds(1));
    app.post_event(&bob, "profs", "between sessions").await;
    app.advance(Duration::seconds(1));

    let ctx = app
        .engine
        .sign_in(alice.clone(), ClientInfo::default())
        .await
        .unwrap();
    settle().await;
    assert!(ctx.toasts().is_empty());

    app.advance(Duration::seconds(1));
    let second = app.post_event(&bob, "profs", "second session").await;
    settle().await;
    let shown: Vec<_> = ctx.toasts().iter().map(|t| t.id()).collect();
    assert_eq!(shown, vec![second]);
    drop(ctx);

    // Another principal on the same client starts from a fresh watermark
    // and an empty seen set.
    app.advance(Duration::seconds(1));
    let ctx = app
        .engine
        .sign_in(carol, ClientInfo::default())
        .await
        .unwrap();
    settle().await;
    assert!(ctx.toasts().is_empty());

    app.advance(Duration::seconds(1));
    let for_carol = app.post_event(&bob, "profs", "carol's session").await;
    settle().await;
    let shown: Vec<_> = ctx.toasts().iter().map(|t| t.id()).collect();
    assert_eq!(shown, vec![for_carol]);

    ctx.sign_out().await;
}
