use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::error_response;
use crate::models::user::{self, Entity as User, UserSummary};
use crate::models::user_collection::{self, Entity as UserCollection};
use crate::services::{collection_service, stats_service, ServiceError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub collection_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

// List users, newest first, with their collection row counts
pub async fn list_users(State(db): State<DatabaseConnection>) -> impl IntoResponse {
    let users = match User::find()
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .all(&db)
        .await
    {
        Ok(users) => users,
        Err(e) => return error_response(ServiceError::from(e), "User"),
    };

    let counts: Vec<(i32, i64)> = match UserCollection::find()
        .select_only()
        .column(user_collection::Column::UserId)
        .column_as(user_collection::Column::Id.count(), "count")
        .group_by(user_collection::Column::UserId)
        .into_tuple()
        .all(&db)
        .await
    {
        Ok(counts) => counts,
        Err(e) => return error_response(ServiceError::from(e), "User"),
    };
    let count_map: HashMap<i32, i64> = counts.into_iter().collect();

    let dtos: Vec<UserDto> = users
        .into_iter()
        .map(|u| UserDto {
            collection_count: count_map.get(&u.id).copied().unwrap_or(0),
            id: u.id,
            email: u.email,
            name: u.name,
            created_at: u.created_at,
            updated_at: u.updated_at,
        })
        .collect();

    (StatusCode::OK, Json(dtos)).into_response()
}

// Get a user with their collection rows (coins nested)
pub async fn get_user(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let user = match User::find_by_id(id).one(&db).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(ServiceError::NotFound, "User"),
        Err(e) => return error_response(ServiceError::from(e), "User"),
    };

    let items = match collection_service::items_for_user(&db, user.id).await {
        Ok(items) => items,
        Err(e) => return error_response(e, "User"),
    };

    (
        StatusCode::OK,
        Json(json!({
            "id": user.id,
            "email": user.email,
            "name": user.name,
            "createdAt": user.created_at,
            "updatedAt": user.updated_at,
            "collections": items,
        })),
    )
        .into_response()
}

pub async fn create_user(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<CreateUserRequest>,
) -> impl IntoResponse {
    let email = match payload.email.filter(|e| !e.trim().is_empty()) {
        Some(email) => email,
        None => {
            return error_response(
                ServiceError::Validation("Missing required field: email".to_string()),
                "User",
            )
        }
    };

    let now = chrono::Utc::now().to_rfc3339();
    let new_user = user::ActiveModel {
        email: Set(email),
        name: Set(payload.name),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    match new_user.insert(&db).await {
        Ok(model) => (StatusCode::CREATED, Json(model)).into_response(),
        Err(e) => match ServiceError::from(e) {
            ServiceError::Conflict(_) => error_response(
                ServiceError::Conflict("User with this email already exists".to_string()),
                "User",
            ),
            other => error_response(other, "User"),
        },
    }
}

pub async fn update_user(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    let user = match User::find_by_id(id).one(&db).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(ServiceError::NotFound, "User"),
        Err(e) => return error_response(ServiceError::from(e), "User"),
    };

    let mut active: user::ActiveModel = user.into();
    if let Some(email) = payload.email {
        if email.trim().is_empty() {
            return error_response(
                ServiceError::Validation("email must not be empty".to_string()),
                "User",
            );
        }
        active.email = Set(email);
    }
    if let Some(name) = payload.name {
        active.name = Set(Some(name));
    }
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    match active.update(&db).await {
        Ok(model) => (StatusCode::OK, Json(model)).into_response(),
        Err(e) => match ServiceError::from(e) {
            ServiceError::Conflict(_) => error_response(
                ServiceError::Conflict("User with this email already exists".to_string()),
                "User",
            ),
            other => error_response(other, "User"),
        },
    }
}

// Delete a user, rejected while collection rows still reference them
pub async fn delete_user(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let user = match User::find_by_id(id).one(&db).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(ServiceError::NotFound, "User"),
        Err(e) => return error_response(ServiceError::from(e), "User"),
    };

    let item_count = match UserCollection::find()
        .filter(user_collection::Column::UserId.eq(user.id))
        .count(&db)
        .await
    {
        Ok(count) => count,
        Err(e) => return error_response(ServiceError::from(e), "User"),
    };

    if item_count > 0 {
        return error_response(
            ServiceError::Validation(
                "Cannot delete user that has collection items".to_string(),
            ),
            "User",
        );
    }

    match user.delete(&db).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(ServiceError::from(e), "User"),
    }
}

// Per-user collection statistics
pub async fn get_user_stats(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let user = match User::find_by_id(id).one(&db).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(ServiceError::NotFound, "User"),
        Err(e) => return error_response(ServiceError::from(e), "User"),
    };

    match stats_service::collection_stats(&db, user.id).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(json!({
                "user": UserSummary::from(user),
                "stats": stats,
            })),
        )
            .into_response(),
        Err(e) => error_response(e, "User"),
    }
}
