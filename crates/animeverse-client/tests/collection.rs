use std::sync::Arc;
use std::time::Duration;

use animeverse_api_models::{
    AnimeDraft, AnimeStatus, ContentRating, LoginRequest, QueryPatch, RandomOptions,
};
use animeverse_client::{Animeverse, ClientError, KeyValueStore, MemoryStorage, SESSION_KEY};
use animeverse_test_support::fixtures;
use anyhow::Result;
use httpmock::prelude::*;
use reqwest::Client;
use serde_json::json;

fn app_for(server: &MockServer, admin: bool) -> Result<Animeverse> {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(SESSION_KEY, &fixtures::session_record("ana", "t-1", admin))?;
    let backend: Arc<dyn KeyValueStore> = storage;
    Ok(Animeverse::with_parts(Client::new(), &server.base_url(), backend))
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

fn draft() -> AnimeDraft {
    AnimeDraft {
        title: "Mushishi".into(),
        image_url: "https://cdn.example.com/covers/mushishi.jpg".into(),
        synopsis: "Ginko wanders.".into(),
        genres: vec!["Mystery".into()],
        rating: 8.7,
        season_count: 2,
        episode_count: 46,
        status: AnimeStatus::Finished,
        release_year: 2005,
        studio: "Artland".into(),
        content_rating: ContentRating::Pg13,
    }
}

#[tokio::test]
async fn identical_fetch_is_served_from_memo() -> Result<()> {
    let server = MockServer::start_async().await;
    let listing = server.mock(|when, then| {
        when.method(GET)
            .path("/animes")
            .query_param("page", "1")
            .query_param("limit", "20")
            .query_param("sort", "rating")
            .query_param("order", "desc");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::page(
                vec![fixtures::anime("a1", "Frieren", "PG-13")],
                41,
                1,
                3,
            ));
    });
    let app = app_for(&server, false)?;

    app.collection().fetch_animes(&QueryPatch::new()).await?;
    app.collection().fetch_animes(&QueryPatch::new()).await?;

    listing.assert_calls(1);
    let snapshot = app.collection().snapshot();
    assert_eq!(snapshot.animes.len(), 1);
    assert_eq!(snapshot.total, 41);
    assert_eq!(snapshot.total_pages, 3);
    assert!(!snapshot.loading);
    assert!(snapshot.error.is_none());
    Ok(())
}

#[tokio::test]
async fn patches_merge_over_the_current_query() -> Result<()> {
    let server = MockServer::start_async().await;
    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/animes")
            .query_param("page", "2")
            .query_param("genre", "Action");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::page(Vec::new(), 0, 2, 0));
    });
    let filtered = server.mock(|when, then| {
        when.method(GET)
            .path("/animes")
            .query_param("page", "2")
            .query_param("genre", "Drama");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::page(
                vec![fixtures::anime("a2", "Clannad", "G")],
                21,
                2,
                2,
            ));
    });
    let app = app_for(&server, false)?;

    app.collection()
        .fetch_animes(&QueryPatch::new().page(2).genre("Action"))
        .await?;
    first.assert_calls(1);

    app.collection()
        .fetch_animes(&QueryPatch::new().genre("Drama"))
        .await?;

    filtered.assert_calls(1);
    let query = app.collection().query();
    assert_eq!(query.page, 2);
    assert_eq!(query.genre.as_deref(), Some("Drama"));
    Ok(())
}

#[tokio::test]
async fn kid_profile_forces_ratings_and_resets_page() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_profiles(&server);
    let unrestricted = server.mock(|when, then| {
        when.method(GET).path("/animes").query_param("page", "3");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::page(
                vec![fixtures::anime("a9", "Berserk", "R")],
                60,
                3,
                3,
            ));
    });
    let restricted = server.mock(|when, then| {
        when.method(GET)
            .path("/animes")
            .query_param("page", "1")
            .query_param("contentRating", "G,PG");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::page(
                vec![fixtures::anime("a1", "Chi's Sweet Home", "G")],
                12,
                1,
                1,
            ));
    });
    let app = app_for(&server, false)?;
    app.sync().await;
    app.collection().fetch_animes(&QueryPatch::new().page(3)).await?;
    unrestricted.assert_calls(1);

    app.select_profile("p1").await?;

    restricted.assert_calls(1);
    let snapshot = app.collection().snapshot();
    assert_eq!(snapshot.page, 1);
    assert_eq!(snapshot.query.page, 1);
    assert_eq!(snapshot.animes[0].content_rating, ContentRating::G);

    // Caller-supplied ratings cannot widen the restriction.
    app.collection()
        .fetch_animes(&QueryPatch::new().content_rating(vec![ContentRating::R]))
        .await?;
    restricted.assert_calls(1);
    Ok(())
}

#[tokio::test]
async fn login_then_kid_selection_loads_restricted_catalog() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/auth/login");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::auth_envelope("ana", "t-1", false));
    });
    let profiles = mock_profiles(&server);
    let catalog = server.mock(|when, then| {
        when.method(GET)
            .path("/animes")
            .header("authorization", "Bearer t-1")
            .header("profileid", "p1")
            .query_param("page", "1")
            .query_param("contentRating", "G,PG");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::page(
                vec![fixtures::anime("a1", "Chi's Sweet Home", "G")],
                1,
                1,
                1,
            ));
    });

    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());
    let app = Animeverse::with_parts(Client::new(), &server.base_url(), backend);
    app.login(&LoginRequest {
        email: "ana@example.com".into(),
        password: "secret".into(),
    })
    .await?;
    profiles.assert_calls(1);
    assert_eq!(app.profiles().profiles().len(), 2);

    app.select_profile("p1").await?;

    catalog.assert_calls(1);
    assert_eq!(app.collection().animes().len(), 1);
    Ok(())
}

#[tokio::test]
async fn search_forces_first_page() -> Result<()> {
    let server = MockServer::start_async().await;
    let search = server.mock(|when, then| {
        when.method(GET)
            .path("/animes/search")
            .query_param("q", "naruto")
            .query_param("page", "1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::data(json!([fixtures::anime("a5", "Naruto", "PG-13")])));
    });
    let app = app_for(&server, false)?;

    app.collection()
        .search_animes("  naruto ", &QueryPatch::new().page(4))
        .await?;

    search.assert();
    let snapshot = app.collection().snapshot();
    assert_eq!(snapshot.query.search.as_deref(), Some("naruto"));
    assert_eq!(snapshot.total, 1);
    assert_eq!(snapshot.page, 1);
    Ok(())
}

#[tokio::test]
async fn failed_listing_records_error_and_keeps_items() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/animes");
        then.status(500)
            .header("content-type", "application/json")
            .json_body(fixtures::error("database offline"));
    });
    let app = app_for(&server, false)?;

    let err = app
        .collection()
        .fetch_animes(&QueryPatch::new())
        .await
        .expect_err("server error should surface");

    assert_eq!(err.status(), Some(500));
    assert_eq!(app.collection().error().as_deref(), Some("database offline"));
    assert!(!app.collection().is_loading());
    Ok(())
}

#[tokio::test]
async fn catalog_changes_require_admin() -> Result<()> {
    let server = MockServer::start_async().await;
    let create = server.mock(|when, then| {
        when.method(POST).path("/animes");
        then.status(201);
    });
    let app = app_for(&server, false)?;

    let err = app
        .collection()
        .create_anime(&draft())
        .await
        .expect_err("non-admin must be refused");
    assert!(matches!(err, ClientError::AdminRequired));

    let err = app
        .collection()
        .search_external_api("Mushishi")
        .await
        .expect_err("non-admin must be refused");
    assert!(matches!(err, ClientError::AdminRequired));

    create.assert_calls(0);
    Ok(())
}

#[tokio::test]
async fn admin_create_reloads_current_page() -> Result<()> {
    let server = MockServer::start_async().await;
    let listing = server.mock(|when, then| {
        when.method(GET).path("/animes");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::page(
                vec![fixtures::anime("a1", "Frieren", "PG-13")],
                1,
                1,
                1,
            ));
    });
    let body = serde_json::to_value(draft())?;
    assert_eq!(body["contentRating"], "PG-13");
    let create = server.mock(|when, then| {
        when.method(POST).path("/animes").json_body(body);
        then.status(201)
            .header("content-type", "application/json")
            .json_body(fixtures::data(fixtures::anime("a2", "Mushishi", "PG-13")));
    });
    let app = app_for(&server, true)?;
    app.collection().fetch_animes(&QueryPatch::new()).await?;

    let created = app.collection().create_anime(&draft()).await?;

    create.assert();
    listing.assert_calls(2);
    assert_eq!(created.id, "a2");
    Ok(())
}

#[tokio::test]
async fn invalid_draft_is_rejected_locally() -> Result<()> {
    let server = MockServer::start_async().await;
    let create = server.mock(|when, then| {
        when.method(POST).path("/animes");
        then.status(201);
    });
    let app = app_for(&server, true)?;
    let mut bad = draft();
    bad.rating = 11.0;

    let err = app
        .collection()
        .create_anime(&bad)
        .await
        .expect_err("invalid rating must be refused");

    assert!(matches!(err, ClientError::InvalidField { ref field, .. } if field == "rating"));
    create.assert_calls(0);
    Ok(())
}

#[tokio::test]
async fn delete_removes_item_and_decrements_total() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/animes");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::page(
                vec![
                    fixtures::anime("a1", "Frieren", "PG-13"),
                    fixtures::anime("a2", "Mushishi", "PG-13"),
                ],
                2,
                1,
                1,
            ));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/animes/a1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"message": "Anime deleted"}));
    });
    let app = app_for(&server, true)?;
    app.collection().fetch_animes(&QueryPatch::new()).await?;

    app.collection().delete_anime("a1").await?;

    delete.assert();
    let snapshot = app.collection().snapshot();
    assert_eq!(snapshot.total, 1);
    assert_eq!(snapshot.animes.len(), 1);
    assert_eq!(snapshot.animes[0].id, "a2");
    Ok(())
}

#[tokio::test]
async fn recommendations_and_genres_degrade_to_empty() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/animes/random");
        then.status(500).json_body(fixtures::error("boom"));
    });
    server.mock(|when, then| {
        when.method(GET).path("/animes/genres");
        then.status(500).json_body(fixtures::error("boom"));
    });
    let app = app_for(&server, false)?;

    assert!(
        app.collection()
            .get_random_animes(&RandomOptions::default())
            .await
            .is_empty()
    );
    assert!(app.collection().get_genres().await.is_empty());
    assert!(app.collection().error().is_none());
    Ok(())
}

#[tokio::test]
async fn recommendations_follow_active_profile_policy() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_profiles(&server);
    let random = server.mock(|when, then| {
        when.method(GET)
            .path("/animes/random")
            .query_param("count", "5")
            .query_param("contentRating", "G,PG");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::data(json!([fixtures::anime("a1", "Totoro", "G")])));
    });
    let app = app_for(&server, false)?;
    app.profiles().sync_with_session().await?;
    app.profiles().select_profile("p1")?;

    let picks = app
        .collection()
        .get_random_animes(&RandomOptions::default())
        .await;

    random.assert();
    assert_eq!(picks.len(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_item_reports_not_found() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/animes/nope");
        then.status(404)
            .header("content-type", "application/json")
            .json_body(fixtures::error("Anime not found"));
    });
    let app = app_for(&server, false)?;

    let err = app
        .collection()
        .get_anime("nope")
        .await
        .expect_err("missing item should fail");

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Anime not found");
    Ok(())
}

fn mock_page<'a>(server: &'a MockServer, page: u32, title: &str) -> httpmock::Mock<'a> {
    let body = fixtures::page(
        vec![fixtures::anime(&format!("a{page}"), title, "PG-13")],
        60,
        page,
        3,
    );
    server.mock(|when, then| {
        when.method(GET)
            .path("/animes")
            .query_param("page", page.to_string());
        then.status(200)
            .header("content-type", "application/json")
            .json_body(body);
    })
}

#[tokio::test]
async fn returning_to_the_loaded_page_supersedes_a_pending_fetch() -> Result<()> {
    let server = MockServer::start_async().await;
    let first = mock_page(&server, 1, "First");
    let second = server.mock(|when, then| {
        when.method(GET).path("/animes").query_param("page", "2");
        then.status(200)
            .header("content-type", "application/json")
            .delay(Duration::from_millis(400))
            .json_body(fixtures::page(
                vec![fixtures::anime("a2", "Second", "PG-13")],
                60,
                2,
                3,
            ));
    });
    let app = app_for(&server, false)?;
    app.collection().fetch_animes(&QueryPatch::new().page(1)).await?;

    let pending = {
        let collection = app.collection().clone();
        tokio::spawn(async move { collection.fetch_animes(&QueryPatch::new().page(2)).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    app.collection().fetch_animes(&QueryPatch::new().page(1)).await?;
    pending.await??;

    first.assert_calls(2);
    second.assert_calls(1);
    let snapshot = app.collection().snapshot();
    assert_eq!(snapshot.page, 1);
    assert_eq!(snapshot.query.page, 1);
    assert_eq!(snapshot.animes[0].title, "First");
    Ok(())
}

#[tokio::test]
async fn late_response_does_not_overwrite_newer_page() -> Result<()> {
    let server = MockServer::start_async().await;
    let slow = server.mock(|when, then| {
        when.method(GET).path("/animes").query_param("page", "2");
        then.status(200)
            .header("content-type", "application/json")
            .delay(Duration::from_millis(400))
            .json_body(fixtures::page(
                vec![fixtures::anime("a2", "Second", "PG-13")],
                60,
                2,
                3,
            ));
    });
    let fast = mock_page(&server, 3, "Third");
    let app = app_for(&server, false)?;

    let pending = {
        let collection = app.collection().clone();
        tokio::spawn(async move { collection.fetch_animes(&QueryPatch::new().page(2)).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    app.collection().fetch_animes(&QueryPatch::new().page(3)).await?;
    pending.await??;

    slow.assert_calls(1);
    fast.assert_calls(1);
    let snapshot = app.collection().snapshot();
    assert_eq!(snapshot.page, 3);
    assert_eq!(snapshot.query.page, 3);
    assert_eq!(snapshot.animes[0].title, "Third");
    assert!(!snapshot.loading);
    Ok(())
}

#[tokio::test]
async fn failed_fetch_keeps_the_shown_query() -> Result<()> {
    let server = MockServer::start_async().await;
    let first = mock_page(&server, 1, "First");
    let broken = server.mock(|when, then| {
        when.method(GET).path("/animes").query_param("page", "2");
        then.status(500)
            .header("content-type", "application/json")
            .json_body(fixtures::error("database offline"));
    });
    let app = app_for(&server, false)?;
    app.collection().fetch_animes(&QueryPatch::new()).await?;

    app.collection()
        .fetch_animes(&QueryPatch::new().page(2))
        .await
        .expect_err("page 2 is unavailable");

    let snapshot = app.collection().snapshot();
    assert_eq!(snapshot.query.page, 1);
    assert_eq!(snapshot.page, 1);
    assert_eq!(snapshot.animes[0].title, "First");
    assert_eq!(snapshot.error.as_deref(), Some("database offline"));

    // Later patches build on the page that is shown, not the failed one.
    app.collection().fetch_animes(&QueryPatch::new()).await?;
    first.assert_calls(1);
    broken.assert_calls(1);
    Ok(())
}

#[tokio::test]
async fn blank_search_lists_the_catalog() -> Result<()> {
    let server = MockServer::start_async().await;
    let search = server.mock(|when, then| {
        when.method(GET).path("/animes/search");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::data(json!([])));
    });
    let listing = mock_page(&server, 1, "First");
    let app = app_for(&server, false)?;

    app.collection()
        .search_animes("   ", &QueryPatch::new().page(3))
        .await?;

    listing.assert();
    search.assert_calls(0);
    let snapshot = app.collection().snapshot();
    assert!(snapshot.query.search.is_none());
    assert_eq!(snapshot.page, 1);
    Ok(())
}

#[tokio::test]
async fn losing_the_kid_profile_lifts_the_restriction() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_profiles(&server);
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/profiles/p1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"message": "Profile deleted"}));
    });
    let mut restricted = server.mock(|when, then| {
        when.method(GET)
            .path("/animes")
            .query_param("page", "1")
            .query_param("contentRating", "G,PG");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::page(
                vec![fixtures::anime("a1", "Chi's Sweet Home", "G")],
                1,
                1,
                1,
            ));
    });
    let app = app_for(&server, false)?;
    app.sync().await;
    app.select_profile("p1").await?;
    restricted.assert_calls(1);
    restricted.delete();
    let open = mock_page(&server, 1, "Berserk");

    app.profiles().delete_profile("p1").await?;
    app.sync().await;

    delete.assert();
    open.assert_calls(1);
    let snapshot = app.collection().snapshot();
    assert_eq!(snapshot.animes[0].title, "Berserk");
    assert!(snapshot.query.content_rating.is_none());
    assert!(snapshot.error.is_none());

    app.sync().await;
    open.assert_calls(1);
    Ok(())
}

#[tokio::test]
async fn sign_out_clears_the_catalog_page() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_profiles(&server);
    server.mock(|when, then| {
        when.method(GET).path("/animes").query_param("contentRating", "G,PG");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::page(
                vec![fixtures::anime("a1", "Chi's Sweet Home", "G")],
                1,
                1,
                1,
            ));
    });
    let app = app_for(&server, false)?;
    app.sync().await;
    app.select_profile("p1").await?;
    assert_eq!(app.collection().animes().len(), 1);

    app.logout().await;

    let snapshot = app.collection().snapshot();
    assert!(snapshot.animes.is_empty());
    assert_eq!(snapshot.total, 0);
    assert_eq!(snapshot.query.page, 1);
    Ok(())
}

#[tokio::test]
async fn admin_update_patches_the_shown_item() -> Result<()> {
    let server = MockServer::start_async().await;
    let listing = server.mock(|when, then| {
        when.method(GET).path("/animes");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::page(
                vec![
                    fixtures::anime("a1", "Mushi-shi", "PG-13"),
                    fixtures::anime("a2", "Frieren", "PG-13"),
                ],
                2,
                1,
                1,
            ));
    });
    let body = serde_json::to_value(draft())?;
    let update = server.mock(|when, then| {
        when.method(PUT).path("/animes/a1").json_body(body);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(fixtures::data(fixtures::anime("a1", "Mushishi", "PG-13")));
    });
    let app = app_for(&server, true)?;
    app.collection().fetch_animes(&QueryPatch::new()).await?;

    let updated = app.collection().update_anime("a1", &draft()).await?;

    update.assert();
    listing.assert_calls(1);
    assert_eq!(updated.title, "Mushishi");
    let titles: Vec<String> = app
        .collection()
        .animes()
        .into_iter()
        .map(|anime| anime.title)
        .collect();
    assert_eq!(titles, ["Mushishi", "Frieren"]);
    Ok(())
}

#[tokio::test]
async fn admin_import_reloads_current_page() -> Result<()> {
    let server = MockServer::start_async().await;
    let listing = mock_page(&server, 1, "Frieren");
    let import = server.mock(|when, then| {
        when.method(POST)
            .path("/animes/external/import")
            .json_body(json!({"externalId": "mal-457"}));
        then.status(201)
            .header("content-type", "application/json")
            .json_body(fixtures::data(fixtures::anime("a7", "Mushishi", "PG-13")));
    });
    let app = app_for(&server, true)?;
    app.collection().fetch_animes(&QueryPatch::new()).await?;

    let imported = app.collection().import_from_external_api("mal-457").await?;

    import.assert();
    listing.assert_calls(2);
    assert_eq!(imported.id, "a7");
    Ok(())
}
