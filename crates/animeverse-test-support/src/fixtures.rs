//! JSON payloads shaped like the Animeverse API's responses.
//!
//! Identifiers are emitted Mongo-style (`_id`) to exercise the alias handling
//! in the DTOs.

use serde_json::{Value, json};

/// A user record as returned inside auth payloads.
#[must_use]
pub fn user(id: &str, username: &str, is_admin: bool) -> Value {
    json!({
        "_id": id,
        "username": username,
        "email": format!("{username}@example.com"),
        "isAdmin": is_admin,
    })
}

/// `{data: {...user, token}}` as answered by login and register.
#[must_use]
pub fn auth_envelope(username: &str, token: &str, is_admin: bool) -> Value {
    let mut payload = user(&format!("u-{username}"), username, is_admin);
    payload["token"] = json!(token);
    json!({ "data": payload })
}

/// The persisted session record for a signed-in user.
#[must_use]
pub fn session_record(username: &str, token: &str, is_admin: bool) -> String {
    let mut payload = user(&format!("u-{username}"), username, is_admin);
    payload["token"] = json!(token);
    payload.to_string()
}

/// A viewer profile.
#[must_use]
pub fn profile(id: &str, name: &str, profile_type: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "type": profile_type,
        "avatar": format!("https://cdn.example.com/avatars/{id}.png"),
    })
}

/// A catalog item.
#[must_use]
pub fn anime(id: &str, title: &str, content_rating: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "imageUrl": format!("https://cdn.example.com/covers/{id}.jpg"),
        "synopsis": format!("{title} synopsis"),
        "genres": ["Action", "Fantasy"],
        "rating": 8.2,
        "seasonCount": 1,
        "episodeCount": 12,
        "status": "Finalizado",
        "releaseYear": 2019,
        "studio": "Studio Example",
        "contentRating": content_rating,
    })
}

/// A watchlist entry with its catalog item populated.
#[must_use]
pub fn watchlist_entry(id: &str, profile_id: &str, anime_id: &str, status: &str, favorite: bool) -> Value {
    json!({
        "_id": id,
        "profileId": profile_id,
        "anime": anime(anime_id, &format!("Title {anime_id}"), "PG"),
        "status": status,
        "isFavorite": favorite,
        "createdAt": "2024-05-01T12:00:00Z",
        "updatedAt": "2024-05-02T12:00:00Z",
    })
}

/// Server-computed watchlist aggregate wrapped in the `{data}` envelope.
#[must_use]
pub fn stats_envelope(total: u64, favorites: u64, watching: u64, completed: u64) -> Value {
    json!({
        "data": {
            "total": total,
            "favorites": favorites,
            "watching": watching,
            "completed": completed,
        }
    })
}

/// `{data}` envelope without pagination.
#[must_use]
pub fn data(value: Value) -> Value {
    json!({ "data": value })
}

/// `{data, pagination}` envelope for list endpoints.
#[must_use]
pub fn page(items: Vec<Value>, total: u64, page: u32, total_pages: u32) -> Value {
    json!({
        "data": items,
        "pagination": {
            "total": total,
            "page": page,
            "totalPages": total_pages,
        }
    })
}

/// `{message}` error body.
#[must_use]
pub fn error(message: &str) -> Value {
    json!({ "message": message })
}
