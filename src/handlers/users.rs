use axum::extract::State;
use axum::Json;

use crate::auth::identity::AdminIdentity;
use crate::database::models::user::UserView;
use crate::error::ApiError;
use crate::repositories::users;
use crate::AppState;

/// Admin-only listing of all users, password hashes excluded.
pub async fn list(
    State(state): State<AppState>,
    _identity: AdminIdentity,
) -> Result<Json<Vec<UserView>>, ApiError> {
    Ok(Json(users::list(&state.pool).await?))
}
