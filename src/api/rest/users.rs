use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::post;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::User;
use crate::state::{AppState, claim_unique};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/users", post(create_user))
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<User>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if !payload.email.contains('@') {
        return Err(AppError::Validation("invalid email".to_string()));
    }

    let id = Uuid::new_v4();
    if !claim_unique(&state.user_contacts, &payload.email, id) {
        return Err(AppError::Conflict(
            "user with this email or phone number already exists".to_string(),
        ));
    }
    if !claim_unique(&state.user_contacts, &payload.phone_number, id) {
        state.user_contacts.remove(&payload.email);
        return Err(AppError::Conflict(
            "user with this email or phone number already exists".to_string(),
        ));
    }

    let user = User {
        id,
        name: payload.name,
        email: payload.email,
        phone_number: payload.phone_number,
        created_at: Utc::now(),
    };

    state.users.insert(user.id, user.clone());
    Ok(Json(user))
}
