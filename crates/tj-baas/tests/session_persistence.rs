use std::time::Duration;

use chrono::{TimeDelta, Utc};
use pretty_assertions::assert_eq;
use tj_baas::token_store::TokenFile;
use tj_baas::{Baas, HttpBaas};
use tj_core::Session;

fn stored_session(expires_in: TimeDelta) -> Session {
    Session {
        user_id: "user-0001".into(),
        email: Some("ana@example.com".into()),
        access_token: "header.payload.sig".into(),
        refresh_token: "refresh-1".into(),
        expires_at: Some(Utc::now() + expires_in),
    }
}

fn unreachable_client() -> HttpBaas {
    HttpBaas::new(
        "http://127.0.0.1:1",
        "anon",
        Duration::from_secs(2),
        Duration::from_secs(1),
    )
    .expect("client builds")
}

#[tokio::test]
async fn restored_session_is_served_without_a_request() {
    let dir = tempfile::tempdir().unwrap();
    let file = TokenFile::new(dir.path().join("auth.json"));
    let session = stored_session(TimeDelta::hours(1));
    file.store(&session).unwrap();

    let baas = unreachable_client().with_token_file(file);

    assert_eq!(baas.get_session().await.unwrap(), Some(session));
}

#[tokio::test]
async fn expiring_session_needs_the_service() {
    let dir = tempfile::tempdir().unwrap();
    let file = TokenFile::new(dir.path().join("auth.json"));
    file.store(&stored_session(TimeDelta::seconds(10))).unwrap();

    let baas = unreachable_client().with_token_file(file);

    let err = baas.get_session().await.unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err}");
}

#[tokio::test]
async fn sign_out_forgets_locally_even_when_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auth.json");
    let file = TokenFile::new(&path);
    file.store(&stored_session(TimeDelta::hours(1))).unwrap();

    let baas = unreachable_client().with_token_file(file);

    assert!(baas.sign_out().await.is_err());
    assert!(baas.get_session().await.unwrap().is_none());
    assert!(TokenFile::new(&path).load().is_none());
}
