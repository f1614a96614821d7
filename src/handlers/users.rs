use axum::{extract::State, Extension, Json};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::entities::user;
use crate::error::{AppError, AppResult};
use crate::handlers::auth::UserInfo;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
}

/// Current user's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<UserInfo>> {
    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Update the current user's name and email
pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserInfo>> {
    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // Re-check email uniqueness only when it actually changes
    if payload.email != user.email {
        let taken = user::Entity::find()
            .filter(user::Column::Email.eq(&payload.email))
            .one(&state.db)
            .await?
            .is_some();

        if taken {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
    }

    let mut active: user::ActiveModel = user.into();
    active.name = Set(payload.name);
    active.email = Set(payload.email);
    let updated = active.update(&state.db).await?;

    Ok(Json(updated.into()))
}
