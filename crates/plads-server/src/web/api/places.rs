use crate::error::ApiError;
use crate::geocode::GeocodeError;
use crate::images::ImageError;
use crate::state::AppState;
use crate::web::api::middleware::AuthUser;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use plads_common::models::place::Place;
use plads_common::validation;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use plads_db::{NewPlace, PlaceRepo, PlaceRow, UserRepo};

fn to_model(row: PlaceRow) -> Place {
    Place {
        place_id: row.place_id,
        title: row.title,
        description: row.description,
        address: row.address,
        location: plads_common::models::place::Coordinates {
            lat: row.lat,
            lng: row.lng,
        },
        image: row.image,
        creator: row.creator,
    }
}

/// Only the creator may modify or delete a place; everyone else gets
/// the same rejection regardless of the token they carry.
fn ensure_creator(row: &PlaceRow, user_id: Uuid) -> Result<(), ApiError> {
    if row.creator != user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

/// GET /api/places/{pid}
#[tracing::instrument(skip(state))]
pub async fn get_place(
    State(state): State<Arc<AppState>>,
    Path(place_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = PlaceRepo::get(&state.pool, place_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("Could not find a place for the provided place id.".to_string())
        })?;
    Ok(Json(json!({ "place": to_model(row) })))
}

/// GET /api/places/user/{uid} -- looked up through the owner's
/// reference collection, not a store-side join
#[tracing::instrument(skip(state))]
pub async fn get_places_by_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let not_found = || {
        ApiError::NotFound(format!(
            "Could not find any places for the provided user id: {}",
            user_id
        ))
    };

    let user = UserRepo::get_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(not_found)?;

    let rows = PlaceRepo::get_many_ordered(&state.pool, &user.place_ids).await?;
    if rows.is_empty() {
        return Err(not_found());
    }

    let places: Vec<Place> = rows.into_iter().map(to_model).collect();
    Ok(Json(json!({ "places": places })))
}

struct PlaceForm {
    title: String,
    description: String,
    address: String,
    image: Option<(Vec<u8>, String)>,
}

async fn read_place_form(mut multipart: Multipart) -> Result<PlaceForm, ApiError> {
    let mut title = String::new();
    let mut description = String::new();
    let mut address = String::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::InvalidInput)?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => title = field.text().await.map_err(|_| ApiError::InvalidInput)?,
            Some("description") => {
                description = field.text().await.map_err(|_| ApiError::InvalidInput)?
            }
            Some("address") => address = field.text().await.map_err(|_| ApiError::InvalidInput)?,
            Some("image") => {
                let mime = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|_| ApiError::InvalidInput)?;
                image = Some((bytes.to_vec(), mime));
            }
            _ => {}
        }
    }

    Ok(PlaceForm {
        title,
        description,
        address,
        image,
    })
}

/// POST /api/places -- multipart form with title, description, address
/// and an image file. The place row and the owner's collection entry
/// commit in one transaction.
#[tracing::instrument(skip(state, multipart))]
pub async fn create_place(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_place_form(multipart).await?;
    validation::validate_place_create(&form.title, &form.description, &form.address)
        .map_err(|_| ApiError::InvalidInput)?;
    let (image_bytes, image_mime) = form.image.ok_or(ApiError::InvalidInput)?;

    let location = match state.geocoder.resolve(&form.address).await {
        Ok(coords) => coords,
        Err(GeocodeError::NotFound) => return Err(ApiError::LocationNotFound),
        Err(GeocodeError::Failed(e)) => return Err(ApiError::Internal(e)),
    };

    // The creator comes from the token, never from the request body
    UserRepo::get_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Could not find user for provided ID.".to_string()))?;

    let image_key = match state.images.ingest(&image_bytes, &image_mime).await {
        Ok(key) => key,
        Err(ImageError::UnsupportedMime(_)) => return Err(ApiError::UnsupportedImageType),
        Err(ImageError::Failed(e)) => return Err(ApiError::Internal(e)),
    };

    let place = NewPlace {
        place_id: Uuid::new_v4(),
        title: form.title,
        description: form.description,
        address: form.address,
        lat: location.lat,
        lng: location.lng,
        image: image_key,
        creator: user_id,
    };

    if let Err(e) = PlaceRepo::create_with_owner(&state.pool, &place).await {
        // The record never committed, so the ingested image is orphaned
        if let Err(del_err) = state.images.delete(&place.image).await {
            tracing::warn!("Failed to clean up image {}: {:#}", place.image, del_err);
        }
        return Err(ApiError::Internal(e));
    }

    let row = PlaceRepo::get(&state.pool, place.place_id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Created place not readable")))?;

    Ok((StatusCode::CREATED, Json(json!({ "place": to_model(row) }))))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaceRequest {
    pub title: String,
    pub description: String,
}

/// PATCH /api/places/{pid} -- title and description only; only the
/// creator may update
#[tracing::instrument(skip(state, req))]
pub async fn update_place(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(place_id): Path<Uuid>,
    Json(req): Json<UpdatePlaceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_place_update(&req.title, &req.description)
        .map_err(|_| ApiError::InvalidInput)?;

    let row = PlaceRepo::get(&state.pool, place_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Could not find place for this id.".to_string()))?;

    ensure_creator(&row, user_id)?;

    let updated = PlaceRepo::update(&state.pool, place_id, &req.title, &req.description)
        .await?
        .ok_or_else(|| ApiError::NotFound("Could not find place for this id.".to_string()))?;

    Ok(Json(json!({ "place": to_model(updated) })))
}

/// DELETE /api/places/{pid} -- removes the place and its entry in the
/// owner's collection atomically; the stored image is deleted
/// best-effort afterwards
#[tracing::instrument(skip(state))]
pub async fn delete_place(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(place_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = PlaceRepo::get(&state.pool, place_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Could not find place for this id.".to_string()))?;

    ensure_creator(&row, user_id)?;

    PlaceRepo::delete_with_owner(&state.pool, place_id, row.creator).await?;

    // The record deletion already committed; an image-store failure is
    // logged and never surfaced.
    if let Err(e) = state.images.delete(&row.image).await {
        tracing::warn!("Failed to delete image {}: {:#}", row.image, e);
    }

    Ok(Json(
        json!({ "message": format!("Deleted place with id: {}", place_id) }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn place_row(creator: Uuid) -> PlaceRow {
        PlaceRow {
            place_id: Uuid::new_v4(),
            title: "Empire State Building".to_string(),
            description: "One of the most famous sky scrapers in the world!".to_string(),
            address: "20 W 34th St, New York".to_string(),
            lat: 40.7484405,
            lng: -73.9878584,
            image: "place.jpeg".to_string(),
            creator,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_creator_may_modify_own_place() {
        let creator = Uuid::new_v4();
        assert!(ensure_creator(&place_row(creator), creator).is_ok());
    }

    #[test]
    fn test_non_creator_modification_is_forbidden() {
        let row = place_row(Uuid::new_v4());
        let err = ensure_creator(&row, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
