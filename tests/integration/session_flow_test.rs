//! Integration tests for sign-in, sign-out and the session audit log.

mod helpers;

use chrono::Duration;
use serde_json::json;

use schoolhub_core::error::ErrorKind;
use schoolhub_core::traits::document_store::{DocumentStore, WriteMode};
use schoolhub_core::types::document::Fields;
use schoolhub_core::types::id::{PrincipalId, SessionId, TenantId};
use schoolhub_entity::principal::{AuthIdentity, Principal, Role};
use schoolhub_entity::session::{DeviceKind, Session};
use schoolhub_realtime::ClientInfo;

use helpers::{FIREFOX_LINUX, TestApp, settle};

async fn load_session(app: &TestApp, id: SessionId) -> Session {
    app.store
        .get(Session::COLLECTION, &id.to_doc_id())
        .await
        .expect("store read failed")
        .expect("session record missing")
        .decode()
        .expect("session record malformed")
}

#[tokio::test(start_paused = true)]
async fn test_sign_in_records_device_and_sign_out_closes() {
    let app = TestApp::new();
    let teacher = app.principal(Role::Teacher, TenantId::new(), "Teacher");

    let ctx = app
        .engine
        .sign_in(
            teacher.clone(),
            ClientInfo {
                user_agent: Some(FIREFOX_LINUX.to_string()),
                geo: None,
            },
        )
        .await
        .unwrap();
    let session_id = ctx.session_id().expect("session should be recorded");
    assert_eq!(app.engine.recorder().current_session().await, Some(session_id));

    let opened = load_session(&app, session_id).await;
    assert_eq!(opened.principal_id, teacher.id);
    assert_eq!(opened.tenant_id, teacher.tenant_id);
    assert_eq!(opened.display_name, "Teacher");
    assert_eq!(opened.device, DeviceKind::Desktop);
    assert_eq!(opened.browser, "Firefox");
    assert_eq!(opened.os, "Linux");
    assert!(opened.is_open());

    app.advance(Duration::minutes(25));
    ctx.sign_out().await;

    let closed = load_session(&app, session_id).await;
    assert_eq!(closed.duration(), Some(Duration::minutes(25)));
    assert_eq!(app.engine.recorder().current_session().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_inactive_principal_is_refused() {
    let app = TestApp::new();
    let mut student = app.principal(Role::Student, TenantId::new(), "Student");
    student.active = false;

    let err = app
        .engine
        .sign_in(student, ClientInfo::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert!(app.store.is_empty(Session::COLLECTION));
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sign_in_survives_store_outage() {
    let app = TestApp::new();
    let teacher = app.principal(Role::Teacher, TenantId::new(), "Teacher");

    app.store.set_available(false);
    let ctx = app
        .engine
        .sign_in(teacher, ClientInfo::default())
        .await
        .expect("sign-in must not fail on a store outage");
    assert_eq!(ctx.session_id(), None);
    settle().await;
    assert!(ctx.toasts().is_empty());

    app.store.set_available(true);
    ctx.sign_out().await;
    assert!(app.store.is_empty(Session::COLLECTION));
}

#[tokio::test(start_paused = true)]
async fn test_dangling_session_closed_by_next_sign_in() {
    let app = TestApp::new();
    let tenant = TenantId::new();
    let first = app.principal(Role::Teacher, tenant, "First");
    let second = app.principal(Role::Student, tenant, "Second");

    let ctx = app
        .engine
        .sign_in(first.clone(), ClientInfo::default())
        .await
        .unwrap();
    let first_session = ctx.session_id().unwrap();
    drop(ctx);

    // The same browser is reused by someone else.
    app.advance(Duration::minutes(3));
    let ctx = app
        .engine
        .sign_in(second.clone(), ClientInfo::default())
        .await
        .unwrap();
    let second_session = ctx.session_id().unwrap();
    assert_ne!(first_session, second_session);

    let dangling = load_session(&app, first_session).await;
    assert_eq!(dangling.duration(), Some(Duration::minutes(3)));
    assert!(load_session(&app, second_session).await.is_open());

    ctx.sign_out().await;
}

#[tokio::test(start_paused = true)]
async fn test_same_principal_reuses_open_session() {
    let app = TestApp::new();
    let teacher = app.principal(Role::Teacher, TenantId::new(), "Teacher");

    let ctx = app
        .engine
        .sign_in(teacher.clone(), ClientInfo::default())
        .await
        .unwrap();
    let session_id = ctx.session_id().unwrap();
    drop(ctx);

    let ctx = app
        .engine
        .sign_in(teacher, ClientInfo::default())
        .await
        .unwrap();
    assert_eq!(ctx.session_id(), Some(session_id));
    assert_eq!(app.store.len(Session::COLLECTION), 1);

    ctx.sign_out().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_close_is_retried_on_next_open() {
    let app = TestApp::new();
    let teacher = app.principal(Role::Teacher, TenantId::new(), "Teacher");

    let ctx = app
        .engine
        .sign_in(teacher.clone(), ClientInfo::default())
        .await
        .unwrap();
    let stuck = ctx.session_id().unwrap();

    app.store.set_available(false);
    ctx.sign_out().await;
    app.store.set_available(true);
    assert!(load_session(&app, stuck).await.is_open());
    assert_eq!(app.engine.recorder().current_session().await, None);

    app.advance(Duration::minutes(1));
    let ctx = app
        .engine
        .sign_in(teacher, ClientInfo::default())
        .await
        .unwrap();
    let fresh = ctx.session_id().unwrap();
    assert_ne!(fresh, stuck);
    assert!(!load_session(&app, stuck).await.is_open());
    assert!(load_session(&app, fresh).await.is_open());

    ctx.sign_out().await;
}

#[tokio::test(start_paused = true)]
async fn test_session_history_is_privileged_and_tenant_scoped() {
    let app = TestApp::new();
    let tenant = TenantId::new();
    let admin = app.principal(Role::Admin, tenant, "Admin");
    let teacher = app.principal(Role::Teacher, tenant, "Teacher");
    let outsider = app.principal(Role::Teacher, TenantId::new(), "Outsider");

    for principal in [&teacher, &outsider] {
        let ctx = app
            .new_client()
            .sign_in(principal.clone(), ClientInfo::default())
            .await
            .unwrap();
        app.advance(Duration::seconds(30));
        ctx.sign_out().await;
    }

    let ctx_admin = app
        .engine
        .sign_in(admin.clone(), ClientInfo::default())
        .await
        .unwrap();
    let history = ctx_admin.session_history(10).await.unwrap();
    let owners: Vec<PrincipalId> = history.iter().map(|s| s.principal_id).collect();
    assert_eq!(owners, vec![admin.id, teacher.id]);

    let ctx_teacher = app
        .new_client()
        .sign_in(teacher, ClientInfo::default())
        .await
        .unwrap();
    assert!(ctx_teacher.session_history(10).await.unwrap().is_empty());

    ctx_admin.sign_out().await;
    ctx_teacher.sign_out().await;
}

#[tokio::test]
async fn test_directory_provisions_and_normalizes_legacy_roles() {
    let app = TestApp::new();
    let directory = app.engine.directory();

    let identity = AuthIdentity {
        id: PrincipalId::new(),
        email: "founder@school.test".to_string(),
        display_name: None,
    };
    let founder = directory.resolve(&identity).await.unwrap();
    assert_eq!(founder.role, Role::Admin);
    assert!(founder.active);
    assert_eq!(directory.resolve(&identity).await.unwrap(), founder);

    let legacy_id = PrincipalId::new();
    let fields: Fields = json!({
        "id": legacy_id,
        "email": "deputy@school.test",
        "role": "admin2",
        "active": true,
        "tenantId": founder.tenant_id,
        "displayName": "Deputy",
    })
    .as_object()
    .cloned()
    .unwrap();
    app.store
        .write(Principal::COLLECTION, &legacy_id.to_doc_id(), fields, WriteMode::Replace)
        .await
        .unwrap();

    let deputy = directory.get(legacy_id).await.unwrap().unwrap();
    assert_eq!(deputy.role, Role::Manager);
    assert!(deputy.is_privileged());

    let err = directory.set_role(legacy_id, "janitor").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let demoted = directory.set_role(legacy_id, "Teacher").await.unwrap();
    assert_eq!(demoted.role, Role::Teacher);
}
