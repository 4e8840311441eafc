use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use tj_auth::flows::{self, RegisterFlow, RegistrationForm};
use tj_auth::{
    AuthError, AuthEvent, NavModel, NavState, RecordingNavigator, SharedStorage, Storage,
    StorageKey, Subscription, Tab, context,
};
use tj_baas::{Baas, MemoryBaas};
use tj_core::{AccountContext, RoleTag, Route};

fn tab_on(baas: &Arc<MemoryBaas>, storage: &SharedStorage) -> (Tab, Arc<RecordingNavigator>) {
    let nav = Arc::new(RecordingNavigator::new());
    let tab = Tab::new(baas.clone(), Arc::new(storage.open_tab()), nav.clone());
    (tab, nav)
}

fn seed(baas: &MemoryBaas, email: &str, roles: serde_json::Value) -> String {
    let user = baas.add_account(email, "secret1");
    baas.put_profile(json!({ "id": user, "email": email, "name": "Ana", "roles": roles }));
    user
}

fn auth_changes(events: &mut Subscription) -> usize {
    std::iter::from_fn(|| events.try_recv())
        .filter(|event| *event == AuthEvent::AuthStateChanged)
        .count()
}

fn form(email: &str) -> RegistrationForm {
    RegistrationForm {
        name: "Ana Diaz".into(),
        email: email.into(),
        phone: "713-555-0101".into(),
        password: "secret1".into(),
        confirm_password: "secret1".into(),
        city: String::new(),
    }
}

#[tokio::test]
async fn login_lands_on_hinted_dashboard() {
    let baas = Arc::new(MemoryBaas::new());
    let storage = SharedStorage::new();
    let (tab, nav) = tab_on(&baas, &storage);
    seed(&baas, "ana@example.com", json!(["requester", "worker"]));
    let mut events = tab.subscribe();

    let outcome = flows::sign_in(&tab, "ana@example.com", "secret1", Some(RoleTag::Worker))
        .await
        .unwrap();

    assert_eq!(outcome.route, Route::Dashboard(RoleTag::Worker));
    assert_eq!(outcome.route.path(), "/worker-dashboard");
    assert_eq!(outcome.context, AccountContext::new(RoleTag::Worker));
    assert!(!outcome.notice.is_error());
    assert_eq!(nav.history(), vec![Route::Dashboard(RoleTag::Worker)]);
    assert_eq!(auth_changes(&mut events), 1);
    assert_eq!(tab.store.present_keys(), StorageKey::ALL.to_vec());
}

#[tokio::test]
async fn login_hint_does_not_override_held_preference() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, _) = tab_on(&baas, &SharedStorage::new());
    seed(&baas, "ana@example.com", json!(["requester", "worker"]));
    tab.store
        .save_account_context(AccountContext::new(RoleTag::Requester))
        .unwrap();

    let outcome = flows::sign_in(&tab, "ana@example.com", "secret1", Some(RoleTag::Worker))
        .await
        .unwrap();

    assert_eq!(outcome.route, Route::Dashboard(RoleTag::Worker));
    assert_eq!(tab.store.selected_role(), Some(RoleTag::Worker));
    assert_eq!(outcome.context, AccountContext::new(RoleTag::Requester));
    assert_eq!(tab.store.account_context(), Some(AccountContext::new(RoleTag::Requester)));
}

#[tokio::test]
async fn login_without_hint_uses_primary_role() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, _) = tab_on(&baas, &SharedStorage::new());
    seed(&baas, "ana@example.com", json!("['worker','requester']"));

    let outcome = flows::sign_in(&tab, "ana@example.com", "secret1", None)
        .await
        .unwrap();

    assert_eq!(outcome.route, Route::Dashboard(RoleTag::Worker));
    assert_eq!(tab.store.selected_role(), Some(RoleTag::Worker));
}

#[tokio::test]
async fn login_for_unheld_role_names_held_roles_and_signs_out() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, nav) = tab_on(&baas, &SharedStorage::new());
    seed(&baas, "ana@example.com", json!(["requester"]));

    let err = flows::sign_in(&tab, "ana@example.com", "secret1", Some(RoleTag::Worker))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::RoleNotGranted { role: RoleTag::Worker, .. }));
    assert!(err.user_message().contains("You currently have: requester"));
    assert!(baas.get_session().await.unwrap().is_none());
    assert!(tab.store.present_keys().is_empty());
    assert!(nav.history().is_empty());
}

#[tokio::test]
async fn login_maps_credential_errors() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, _) = tab_on(&baas, &SharedStorage::new());
    seed(&baas, "ana@example.com", json!(["requester"]));

    let err = flows::sign_in(&tab, "ana@example.com", "wrong-pw", None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_notice("Login Failed").description,
        "Invalid email or password. Please check your credentials."
    );

    let err = flows::sign_in(&tab, "  ", "", None).await.unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));
}

#[tokio::test]
async fn login_with_missing_profile_fails() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, _) = tab_on(&baas, &SharedStorage::new());
    baas.add_account("ghost@example.com", "secret1");

    let err = flows::sign_in(&tab, "ghost@example.com", "secret1", None)
        .await
        .unwrap_err();
    assert_eq!(
        err.user_message(),
        "User profile not found. Please register first."
    );
}

#[tokio::test]
async fn registration_requires_verification_before_login() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, nav) = tab_on(&baas, &SharedStorage::new());
    let flow = RegisterFlow::new("http://localhost:8080", "Houston");

    let outcome = flow
        .register(&tab, &form("new@example.com"), RoleTag::Worker)
        .await
        .unwrap();

    assert!(!outcome.existing_account);
    assert_eq!(outcome.route.path(), "/login?role=worker");
    assert_eq!(nav.last(), Some(Route::login_for(RoleTag::Worker)));
    let row = baas.profile(&outcome.user_id).unwrap();
    assert_eq!(row["roles"], json!(["worker"]));
    assert_eq!(row["role"], json!("worker"));
    assert_eq!(row["city"], json!("Houston"));

    let err = flows::sign_in(&tab, "new@example.com", "secret1", Some(RoleTag::Worker))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailNotConfirmed));

    baas.confirm_email("new@example.com");
    let login = flows::sign_in(&tab, "new@example.com", "secret1", Some(RoleTag::Worker))
        .await
        .unwrap();
    assert_eq!(login.route, Route::Dashboard(RoleTag::Worker));
}

#[tokio::test]
async fn registering_existing_account_appends_role() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, _) = tab_on(&baas, &SharedStorage::new());
    let user = seed(&baas, "ana@example.com", json!("['requester']"));

    let outcome = RegisterFlow::new("http://localhost:8080", "Houston")
        .register(&tab, &form("ana@example.com"), RoleTag::Worker)
        .await
        .unwrap();

    assert!(outcome.existing_account);
    assert_eq!(outcome.user_id, user);
    assert_eq!(outcome.notice.title, "Worker role added!");
    let row = baas.profile(&user).unwrap();
    assert_eq!(row["roles"], json!(["requester", "worker"]));
    assert_eq!(row["role"], json!("requester"));
    assert!(baas.get_session().await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_registration_never_reaches_backend() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, nav) = tab_on(&baas, &SharedStorage::new());
    let mut bad = form("ana@example.com");
    bad.confirm_password = "different".into();

    let err = RegisterFlow::new("http://localhost:8080", "Houston")
        .register(&tab, &bad, RoleTag::Requester)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Passwords do not match.");
    assert_eq!(baas.calls("sign_in_with_password"), 0);
    assert_eq!(baas.calls("sign_up"), 0);
    assert!(nav.history().is_empty());
}

#[tokio::test]
async fn role_chooser_routes_to_signup() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, nav) = tab_on(&baas, &SharedStorage::new());

    assert_eq!(
        flows::choose_role(&tab, RoleTag::Affiliate).path(),
        "/signup?role=affiliate"
    );
    assert_eq!(flows::signup_role(&tab, Some("worker")), Some(RoleTag::Worker));
    assert_eq!(flows::signup_role(&tab, Some("admin")), None);
    assert_eq!(flows::signup_role(&tab, None), None);
    assert_eq!(
        nav.history(),
        vec![
            Route::Signup {
                role: Some(RoleTag::Affiliate)
            },
            Route::ChooseRole,
            Route::ChooseRole,
        ]
    );
}

#[tokio::test]
async fn verification_link_lands_on_success_page() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, _) = tab_on(&baas, &SharedStorage::new());
    let user = seed(&baas, "ana@example.com", json!(["worker"]));
    let session = baas.sign_in_as(&user);
    baas.sign_out().await.unwrap();

    let url = format!(
        "http://localhost:8080/#access_token={}&refresh_token={}&type=signup",
        session.access_token, session.refresh_token
    );
    let route = flows::verify_email_link(&tab, &url).await;

    assert_eq!(route.path(), "/email-verification-success?role=worker");
    assert!(baas.profile(&user).unwrap().get("updated_at").is_some());
}

#[tokio::test]
async fn bad_verification_link_goes_to_login() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, _) = tab_on(&baas, &SharedStorage::new());

    let incomplete = flows::verify_email_link(&tab, "/#access_token=x&type=signup").await;
    let forged =
        flows::verify_email_link(&tab, "/?access_token=x.y.z&refresh_token=r&type=signup").await;

    assert_eq!(incomplete, Route::Login { role: None });
    assert_eq!(forged, Route::Login { role: None });
}

#[tokio::test]
async fn logout_clears_everything_with_one_event() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, nav) = tab_on(&baas, &SharedStorage::new());
    seed(&baas, "ana@example.com", json!(["requester", "worker"]));
    flows::sign_in(&tab, "ana@example.com", "secret1", None)
        .await
        .unwrap();
    let mut events = tab.subscribe();
    baas.fail_op("sign_out");

    let route = flows::logout(&tab).await.unwrap();

    assert_eq!(route, Route::Home);
    assert_eq!(nav.last(), Some(Route::Home));
    assert!(tab.store.present_keys().is_empty());
    assert_eq!(auth_changes(&mut events), 1);
}

#[tokio::test]
async fn switching_context_requires_held_role() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, nav) = tab_on(&baas, &SharedStorage::new());
    seed(&baas, "ana@example.com", json!(["requester"]));
    flows::sign_in(&tab, "ana@example.com", "secret1", None)
        .await
        .unwrap();
    let mut events = tab.subscribe();
    let before = nav.history().len();

    let err = context::switch(&tab, RoleTag::Worker).unwrap_err();

    assert!(matches!(err, AuthError::RoleNotHeld { role: RoleTag::Worker }));
    assert_eq!(tab.store.account_context(), Some(AccountContext::new(RoleTag::Requester)));
    assert_eq!(auth_changes(&mut events), 0);
    assert_eq!(nav.history().len(), before);
}

#[tokio::test]
async fn switching_context_publishes_once_and_goes_home() {
    let baas = Arc::new(MemoryBaas::new());
    let (tab, nav) = tab_on(&baas, &SharedStorage::new());
    seed(&baas, "ana@example.com", json!(["requester", "worker"]));
    flows::sign_in(&tab, "ana@example.com", "secret1", Some(RoleTag::Requester))
        .await
        .unwrap();
    let mut events = tab.subscribe();

    let route = context::switch(&tab, RoleTag::Worker).unwrap();

    assert_eq!(route, Route::Home);
    assert_eq!(nav.last(), Some(Route::Home));
    assert_eq!(tab.store.account_context(), Some(AccountContext::new(RoleTag::Worker)));
    assert_eq!(tab.store.selected_role(), Some(RoleTag::Worker));
    assert_eq!(auth_changes(&mut events), 1);
}

#[tokio::test]
async fn other_tabs_follow_logout() {
    let baas = Arc::new(MemoryBaas::new());
    let storage = SharedStorage::new();
    let (first, _) = tab_on(&baas, &storage);
    let (second, _) = tab_on(&baas, &storage);
    seed(&baas, "ana@example.com", json!(["requester", "worker"]));
    flows::sign_in(&first, "ana@example.com", "secret1", Some(RoleTag::Worker))
        .await
        .unwrap();

    let mut nav = NavModel::new(second.clone());
    match nav.refresh().await {
        NavState::SignedIn {
            context, switchable, ..
        } => {
            assert_eq!(*context, AccountContext::new(RoleTag::Worker));
            assert_eq!(switchable, &vec![RoleTag::Requester]);
        }
        NavState::Anonymous => panic!("second tab should see the sign-in"),
    }

    flows::logout(&first).await.unwrap();

    let (event, state) = nav.changed().await.unwrap();
    assert!(matches!(event, AuthEvent::StorageChanged { .. }));
    assert_eq!(state, &NavState::Anonymous);
}

#[tokio::test]
async fn nav_falls_back_to_identity_roles_without_cached_list() {
    let baas = Arc::new(MemoryBaas::new());
    let storage = SharedStorage::new();
    let (tab, _) = tab_on(&baas, &storage);
    seed(&baas, "ana@example.com", json!(["requester", "worker"]));
    flows::sign_in(&tab, "ana@example.com", "secret1", None)
        .await
        .unwrap();
    storage
        .open_tab()
        .remove(StorageKey::UserRoles.as_str())
        .unwrap();

    let mut nav = NavModel::new(tab.clone());
    match nav.refresh().await {
        NavState::SignedIn {
            context, switchable, ..
        } => {
            assert_eq!(*context, AccountContext::new(RoleTag::Requester));
            assert_eq!(switchable, &vec![RoleTag::Worker]);
        }
        NavState::Anonymous => panic!("identity roles should keep the viewer signed in"),
    }
}

#[tokio::test]
async fn profile_update_patches_row_and_snapshot() {
    let baas = Arc::new(MemoryBaas::new());
    let storage = SharedStorage::new();
    let (tab, nav) = tab_on(&baas, &storage);
    let user = seed(&baas, "ana@example.com", json!(["requester", "worker"]));
    let outcome = flows::sign_in(&tab, "ana@example.com", "secret1", None)
        .await
        .unwrap();
    let mut events = tab.subscribe();

    let form = flows::ProfileForm {
        name: " Ana Diaz ".into(),
        phone: "713-555-0101".into(),
        city: "Austin".into(),
        ..flows::ProfileForm::from_identity(&outcome.identity)
    };
    let (identity, notice) = flows::update_profile(&tab, &outcome.identity, &form)
        .await
        .unwrap();

    assert_eq!(notice.title, "Profile Updated");
    assert_eq!(identity.name, "Ana Diaz");
    assert_eq!(identity.roles, outcome.identity.roles);
    assert_eq!(tab.store.identity().unwrap(), identity);
    let row = baas.profile(&user).unwrap();
    assert_eq!(row["name"], "Ana Diaz");
    assert_eq!(row["city"], "Austin");
    assert_eq!(row["roles"], json!(["requester", "worker"]));
    assert!(row.get("updated_at").is_some());
    assert_eq!(auth_changes(&mut events), 0);
    assert_eq!(nav.history().len(), 1);
}

#[tokio::test]
async fn failed_profile_update_keeps_the_snapshot() {
    let baas = Arc::new(MemoryBaas::new());
    let storage = SharedStorage::new();
    let (tab, _nav) = tab_on(&baas, &storage);
    seed(&baas, "ana@example.com", json!(["requester"]));
    let outcome = flows::sign_in(&tab, "ana@example.com", "secret1", None)
        .await
        .unwrap();

    let blank = flows::ProfileForm {
        name: "  ".into(),
        ..flows::ProfileForm::from_identity(&outcome.identity)
    };
    let err = flows::update_profile(&tab, &outcome.identity, &blank)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Please enter your full name.");
    assert_eq!(baas.calls("update_profile"), 0);

    baas.fail_op("update_profile");
    let renamed = flows::ProfileForm {
        name: "Someone Else".into(),
        phone: "713-555-0101".into(),
        ..flows::ProfileForm::from_identity(&outcome.identity)
    };
    let err = flows::update_profile(&tab, &outcome.identity, &renamed)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Backend(_)));
    assert_eq!(tab.store.identity().unwrap().name, "Ana");
}
