//! Route handlers
//!
//! Bodies are taken as `Result<Json<_>, JsonRejection>` so malformed JSON is
//! answered with the service's own `{"message"}` shape.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{SubsecRound, Utc};
use networking::{LoginRequest, MessageResponse, PublicUser, RegisterRequest, UpdateUserRequest};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::repository::UserRecord;
use crate::state::AppState;
use crate::{password, validation};

/// `POST /api/register`
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>)> {
    let Json(request) = body?;

    let name = validation::name(&request.name)?;
    let email = validation::email(&request.email)?;
    validation::password(&request.password)?;
    let phone = validation::phone(&request.phone)?;

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(ServiceError::DuplicateEmail);
    }

    let record = UserRecord {
        id: Uuid::new_v4().to_string(),
        name,
        email,
        phone,
        password_hash: password::hash(request.password, state.bcrypt_cost).await?,
        created_at: Utc::now().trunc_subsecs(3),
    };
    state.users.create(&record).await?;

    tracing::info!(user_id = %record.id, "user registered");
    Ok((StatusCode::CREATED, Json(record.to_public())))
}

/// `POST /api/login`
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<PublicUser>> {
    let Json(request) = body?;

    let email = validation::normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return Err(ServiceError::Validation("Email and password are required".to_string()));
    }

    let Some(record) = state.users.find_by_email(&email).await? else {
        tracing::debug!("login for unknown email");
        return Err(ServiceError::InvalidCredentials);
    };

    if !password::verify(request.password, record.password_hash.clone()).await? {
        tracing::debug!(user_id = %record.id, "login with wrong password");
        return Err(ServiceError::InvalidCredentials);
    }

    tracing::info!(user_id = %record.id, "user logged in");
    Ok(Json(record.to_public()))
}

/// `GET /api/users`
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>> {
    let users = state.users.list().await?;
    Ok(Json(users.iter().map(UserRecord::to_public).collect()))
}

/// `GET /api/users/:id`
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>> {
    let record = state.users.find_by_id(&id).await?.ok_or(ServiceError::NotFound)?;
    Ok(Json(record.to_public()))
}

/// `PUT /api/users/:id`, changing only the fields present in the body
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<PublicUser>> {
    let Json(changes) = body?;
    let mut record = state.users.find_by_id(&id).await?.ok_or(ServiceError::NotFound)?;

    if let Some(name) = &changes.name {
        record.name = validation::name(name)?;
    }
    if let Some(phone) = &changes.phone {
        record.phone = validation::phone(phone)?;
    }
    if let Some(email) = &changes.email {
        let email = validation::email(email)?;
        if email != record.email {
            if let Some(other) = state.users.find_by_email(&email).await? {
                if other.id != record.id {
                    return Err(ServiceError::DuplicateEmail);
                }
            }
            record.email = email;
        }
    }
    if let Some(new_password) = changes.password {
        validation::password(&new_password)?;
        record.password_hash = password::hash(new_password, state.bcrypt_cost).await?;
    }

    state.users.update(&record).await?;

    tracing::info!(user_id = %record.id, "user updated");
    Ok(Json(record.to_public()))
}

/// `DELETE /api/users/:id`
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.users.delete(&id).await?;

    tracing::info!(user_id = %id, "user deleted");
    Ok(Json(MessageResponse { message: "User deleted".to_string() }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Result<&'static str> {
    state.users.health_check().await?;
    Ok("ok")
}
