use crate::entities::recipe;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct RecipeIngredientInput {
    /// Catalog ingredient id.
    pub id: i64,
    pub amount: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    /// Base64 data URL; stored under the media root.
    pub image: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredientInput>,
    #[serde(default)]
    pub tags: Vec<i64>,
}

/// PATCH body; absent scalar fields keep their stored values, while a present
/// `ingredients` or `tags` list replaces the stored set wholesale.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<String>,
    pub ingredients: Option<Vec<RecipeIngredientInput>>,
    pub tags: Option<Vec<i64>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeIngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<super::tag::TagResponse>,
    pub author: super::user::UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Compact view used by favorite/cart responses and subscription listings.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeShortResponse {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<&recipe::Model> for RecipeShortResponse {
    fn from(recipe: &recipe::Model) -> Self {
        RecipeShortResponse {
            id: recipe.id,
            name: recipe.name.clone(),
            image: recipe.image.clone(),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}
