use crate::entities::user;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserResponse {
    /// Shapes a stored user for the viewer; `is_subscribed` is the viewer's
    /// follow state, computed by the caller (false for anonymous reads).
    pub fn from_model(user: &user::Model, is_subscribed: bool) -> Self {
        UserResponse {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
            avatar: user.avatar.clone(),
        }
    }
}

/// Body of `PUT /api/users/me/avatar`; the image arrives as a base64 data URL.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAvatarRequest {
    #[schema(example = "data:image/png;base64,iVBORw0KGgo=")]
    pub avatar: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvatarResponse {
    pub avatar: String,
}

/// A followed author together with a capped slice of their recipes.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
    pub recipes: Vec<super::recipe::RecipeShortResponse>,
    pub recipes_count: u64,
}
