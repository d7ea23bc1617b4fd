use std::sync::Arc;

use animeverse_api_models::{
    LoginRequest, ProfileDraft, ProfileType, ProfileUpdate, RatingPolicy,
};
use animeverse_client::{
    ACTIVE_PROFILE_KEY, Animeverse, ClientError, KeyValueStore, MemoryStorage, SESSION_KEY,
};
use animeverse_test_support::fixtures;
use anyhow::Result;
use httpmock::prelude::*;
use reqwest::Client;
use serde_json::json;

async fn signed_in(server: &MockServer, storage: &Arc<MemoryStorage>) -> Result<Animeverse> {
    storage.set(SESSION_KEY, &fixtures::session_record("ana", "t-1", false))?;
    let backend: Arc<dyn KeyValueStore> = storage.clone();
    let app = Animeverse::with_parts(Client::new(), &server.base_url(), backend);
    app.profiles().sync_with_session().await?;
    Ok(app)
}

fn mock_profiles(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path("/profiles");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::data(json!([
                fixtures::profile("p1", "Mika", "kid"),
                fixtures::profile("p2", "Ana", "adult"),
            ])));
    })
}

#[tokio::test]
async fn profiles_load_once_per_sign_in() -> Result<()> {
    let server = MockServer::start_async().await;
    let listing = mock_profiles(&server);
    let storage = Arc::new(MemoryStorage::new());
    let app = signed_in(&server, &storage).await?;

    app.profiles().sync_with_session().await?;
    app.profiles().sync_with_session().await?;

    listing.assert_calls(1);
    assert_eq!(app.profiles().profiles().len(), 2);
    Ok(())
}

#[tokio::test]
async fn select_profile_persists_and_round_trips() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_profiles(&server);
    let storage = Arc::new(MemoryStorage::new());
    let app = signed_in(&server, &storage).await?;
    let mut changes = app.profiles().subscribe();

    let selected = app.profiles().select_profile("p1")?;

    assert_eq!(selected.id, "p1");
    assert_eq!(app.profiles().active_profile().map(|p| p.id).as_deref(), Some("p1"));
    assert_eq!(storage.get(ACTIVE_PROFILE_KEY).as_deref(), Some("p1"));
    assert!(changes.has_changed()?);
    let published = changes.borrow_and_update().clone();
    assert_eq!(published.map(|p| p.id).as_deref(), Some("p1"));
    assert_eq!(
        app.profiles().rating_policy(),
        RatingPolicy::for_type(ProfileType::Kid)
    );
    Ok(())
}

#[tokio::test]
async fn unknown_profile_leaves_selection_untouched() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_profiles(&server);
    let storage = Arc::new(MemoryStorage::new());
    let app = signed_in(&server, &storage).await?;
    app.profiles().select_profile("p2")?;

    let err = app
        .profiles()
        .select_profile("missing")
        .expect_err("unknown id must be rejected");

    assert!(matches!(err, ClientError::ProfileNotFound { ref id } if id == "missing"));
    assert_eq!(app.profiles().active_profile().map(|p| p.id).as_deref(), Some("p2"));
    assert_eq!(storage.get(ACTIVE_PROFILE_KEY).as_deref(), Some("p2"));
    Ok(())
}

#[tokio::test]
async fn persisted_selection_is_restored_after_load() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_profiles(&server);
    let storage = Arc::new(MemoryStorage::new());
    storage.set(ACTIVE_PROFILE_KEY, "p2")?;

    let app = signed_in(&server, &storage).await?;

    assert_eq!(app.profiles().active_profile().map(|p| p.id).as_deref(), Some("p2"));
    Ok(())
}

#[tokio::test]
async fn stale_persisted_selection_is_dropped() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_profiles(&server);
    let storage = Arc::new(MemoryStorage::new());
    storage.set(ACTIVE_PROFILE_KEY, "gone")?;

    let app = signed_in(&server, &storage).await?;

    assert!(app.profiles().active_profile().is_none());
    assert!(storage.get(ACTIVE_PROFILE_KEY).is_none());
    Ok(())
}

#[tokio::test]
async fn deleting_active_profile_clears_selection() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_profiles(&server);
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/profiles/p1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"message": "Profile deleted"}));
    });
    let storage = Arc::new(MemoryStorage::new());
    let app = signed_in(&server, &storage).await?;
    app.profiles().select_profile("p1")?;

    app.profiles().delete_profile("p1").await?;

    delete.assert();
    assert!(app.profiles().active_profile().is_none());
    assert!(storage.get(ACTIVE_PROFILE_KEY).is_none());
    assert_eq!(
        app.profiles()
            .profiles()
            .into_iter()
            .map(|p| p.id)
            .collect::<Vec<_>>(),
        vec!["p2".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn created_profile_is_appended() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_profiles(&server);
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/profiles")
            .json_body(json!({"name": "Ren", "type": "teen"}));
        then.status(201)
            .header("content-type", "application/json")
            .json_body(fixtures::data(fixtures::profile("p3", "Ren", "teen")));
    });
    let storage = Arc::new(MemoryStorage::new());
    let app = signed_in(&server, &storage).await?;

    let created = app
        .profiles()
        .create_profile(&ProfileDraft {
            name: "Ren".into(),
            avatar: None,
            profile_type: ProfileType::Teen,
        })
        .await?;

    create.assert();
    assert_eq!(created.profile_type, ProfileType::Teen);
    assert_eq!(app.profiles().profiles().len(), 3);
    Ok(())
}

#[tokio::test]
async fn type_change_updates_active_policy() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_profiles(&server);
    server.mock(|when, then| {
        when.method(PATCH)
            .path("/profiles/p1/type")
            .json_body(json!({"type": "teen"}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::data(fixtures::profile("p1", "Mika", "teen")));
    });
    let storage = Arc::new(MemoryStorage::new());
    let app = signed_in(&server, &storage).await?;
    app.profiles().select_profile("p1")?;

    app.profiles()
        .change_profile_type("p1", ProfileType::Teen)
        .await?;

    assert_eq!(
        app.profiles().rating_policy(),
        RatingPolicy::for_type(ProfileType::Teen)
    );
    Ok(())
}

#[tokio::test]
async fn sign_out_clears_profiles_without_network() -> Result<()> {
    let server = MockServer::start_async().await;
    let listing = mock_profiles(&server);
    let storage = Arc::new(MemoryStorage::new());
    let app = signed_in(&server, &storage).await?;
    app.profiles().select_profile("p2")?;

    app.logout().await;

    listing.assert_calls(1);
    assert!(app.profiles().profiles().is_empty());
    assert!(app.profiles().active_profile().is_none());
    assert!(storage.get(ACTIVE_PROFILE_KEY).is_none());
    Ok(())
}

#[tokio::test]
async fn next_sign_in_does_not_inherit_previous_profile() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_profiles(&server);
    let storage = Arc::new(MemoryStorage::new());
    let app = signed_in(&server, &storage).await?;
    app.profiles().select_profile("p1")?;
    app.logout().await;

    let login = server.mock(|when, then| {
        when.method(POST).path("/auth/login");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::auth_envelope("bo", "t-2", false));
    });

    app.login(&LoginRequest {
        email: "bo@example.com".into(),
        password: "pw".into(),
    })
    .await?;

    login.assert();
    assert_eq!(app.profiles().profiles().len(), 2);
    assert!(app.profiles().active_profile().is_none());
    assert!(storage.get(ACTIVE_PROFILE_KEY).is_none());
    Ok(())
}

#[tokio::test]
async fn update_replaces_entry_and_active_profile() -> Result<()> {
    let server = MockServer::start_async().await;
    let listing = mock_profiles(&server);
    let storage = Arc::new(MemoryStorage::new());
    let app = signed_in(&server, &storage).await?;
    app.profiles().select_profile("p2")?;
    let active_changes = app.profiles().subscribe();

    let update = server.mock(|when, then| {
        when.method(PUT)
            .path("/profiles/p2")
            .json_body(json!({"name": "Ana B."}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::data(fixtures::profile("p2", "Ana B.", "adult")));
    });

    let updated = app
        .profiles()
        .update_profile(
            "p2",
            &ProfileUpdate {
                name: Some("Ana B.".into()),
                avatar: None,
            },
        )
        .await?;

    update.assert();
    listing.assert_calls(1);
    assert_eq!(updated.name, "Ana B.");
    let names: Vec<String> = app
        .profiles()
        .profiles()
        .into_iter()
        .map(|profile| profile.name)
        .collect();
    assert_eq!(names, ["Mika", "Ana B."]);
    assert_eq!(
        app.profiles().active_profile().map(|profile| profile.name),
        Some("Ana B.".to_string())
    );
    assert!(active_changes.has_changed()?);
    Ok(())
}
