use crate::auth::{create_access_token, hash_password, verify_password};
use crate::error::ApiError;
use crate::images::ImageError;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use plads_common::models::auth::AuthResponse;
use plads_common::models::user::User;
use plads_common::validation;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use plads_db::{is_unique_violation, NewUser, UserRepo, UserRow};

fn to_model(row: UserRow) -> User {
    User {
        user_id: row.user_id,
        name: row.name,
        email: row.email,
        image: row.image,
        places: row.place_ids,
    }
}

/// GET /api/users -- password hashes never leave the store
#[tracing::instrument(skip(state))]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let users: Vec<User> = UserRepo::list(&state.pool)
        .await?
        .into_iter()
        .map(to_model)
        .collect();
    Ok(Json(json!({ "users": users })))
}

struct SignupForm {
    name: String,
    email: String,
    password: String,
    image: Option<(Vec<u8>, String)>,
}

async fn read_signup_form(mut multipart: Multipart) -> Result<SignupForm, ApiError> {
    let mut name = String::new();
    let mut email = String::new();
    let mut password = String::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::InvalidInput)?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => name = field.text().await.map_err(|_| ApiError::InvalidInput)?,
            Some("email") => email = field.text().await.map_err(|_| ApiError::InvalidInput)?,
            Some("password") => {
                password = field.text().await.map_err(|_| ApiError::InvalidInput)?
            }
            Some("image") => {
                let mime = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|_| ApiError::InvalidInput)?;
                image = Some((bytes.to_vec(), mime));
            }
            _ => {}
        }
    }

    Ok(SignupForm {
        name,
        email,
        password,
        image,
    })
}

/// POST /api/users/signup -- multipart form with name, email, password
/// and an avatar image
#[tracing::instrument(skip(state, multipart))]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_signup_form(multipart).await?;
    let email = validation::normalize_email(&form.email);
    validation::validate_signup(&form.name, &email, &form.password)
        .map_err(|_| ApiError::InvalidInput)?;
    let (image_bytes, image_mime) = form.image.ok_or(ApiError::InvalidInput)?;

    if UserRepo::get_by_email(&state.pool, &email).await?.is_some() {
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = hash_password(&form.password)?;

    let image_key = match state.images.ingest(&image_bytes, &image_mime).await {
        Ok(key) => key,
        Err(ImageError::UnsupportedMime(_)) => return Err(ApiError::UnsupportedImageType),
        Err(ImageError::Failed(e)) => return Err(ApiError::Internal(e)),
    };

    let user = NewUser {
        user_id: Uuid::new_v4(),
        name: form.name,
        email,
        password_hash,
        image: image_key,
    };

    if let Err(e) = UserRepo::create(&state.pool, &user).await {
        if let Err(del_err) = state.images.delete(&user.image).await {
            tracing::warn!("Failed to clean up image {}: {:#}", user.image, del_err);
        }
        // Backstop for a signup racing the pre-check on the same email
        if is_unique_violation(&e) {
            return Err(ApiError::DuplicateEmail);
        }
        return Err(ApiError::Internal(e));
    }

    let token = create_access_token(
        &user.user_id.to_string(),
        &user.email,
        &state.config.jwt_secret,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id: user.user_id,
            email: user.email,
            token,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Check a login attempt against the stored account, if any. An unknown
/// email and a wrong password produce the same error kind, so account
/// existence cannot be probed through the login route.
fn authenticate(user: Option<UserRow>, password: &str) -> Result<UserRow, ApiError> {
    let user = user.ok_or(ApiError::InvalidCredentials)?;
    if !verify_password(password, &user.password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }
    Ok(user)
}

/// POST /api/users/login -- unknown email and wrong password return the
/// identical response, so account existence cannot be probed
#[tracing::instrument(skip(state, req))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validation::normalize_email(&req.email);

    let user = UserRepo::get_by_email(&state.pool, &email).await?;
    let user = authenticate(user, &req.password)?;

    let token = create_access_token(
        &user.user_id.to_string(),
        &user.email,
        &state.config.jwt_secret,
    )?;

    Ok(Json(AuthResponse {
        user_id: user.user_id,
        email: user.email,
        token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stored_user(password: &str) -> UserRow {
        UserRow {
            user_id: Uuid::new_v4(),
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            password_hash: hash_password(password).unwrap(),
            image: "avatar.png".to_string(),
            place_ids: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_login_accepts_correct_password() {
        let user = stored_user("secret1");
        let email = user.email.clone();
        let authed = authenticate(Some(user), "secret1").unwrap();
        assert_eq!(authed.email, email);
    }

    #[test]
    fn test_unknown_email_and_wrong_password_are_indistinguishable() {
        let unknown_email = authenticate(None, "secret1").unwrap_err();
        let wrong_password = authenticate(Some(stored_user("secret1")), "hunter2").unwrap_err();

        assert_eq!(unknown_email.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(unknown_email.status_code(), wrong_password.status_code());
        assert_eq!(unknown_email.to_string(), wrong_password.to_string());
    }
}
