use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{extractors::AdminUser, Role, User},
    error::ApiError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/users", get(list_users))
}

#[derive(Debug, Serialize)]
pub struct UserListItem {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Option<Role>,
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserListItem>>, ApiError> {
    let users = User::list_all(&state.db).await?;
    let items = users
        .into_iter()
        .map(|u| UserListItem {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
        })
        .collect();
    Ok(Json(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_includes_unconfirmed_accounts_with_null_role() {
        let item = UserListItem {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            role: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["role"], serde_json::Value::Null);
        assert_eq!(json["email"], "alice@example.com");
    }
}
