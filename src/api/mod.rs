pub mod auth;
pub mod ingredients;
pub mod links;
pub mod recipes;
pub mod tags;
pub mod users;

use crate::models::{
    AuthResponse, AvatarResponse, CreateRecipeRequest, IngredientResponse, LoginRequest,
    RecipeIngredientInput, RecipeIngredientResponse, RecipeResponse, RecipeShortResponse,
    SetAvatarRequest, ShortLinkResponse, SignupRequest, SubscriptionResponse, TagResponse,
    UpdateRecipeRequest, UserResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth endpoints
        auth::signup,
        auth::login,
        // User endpoints
        users::list_users,
        users::me,
        users::get_user,
        users::set_avatar,
        users::delete_avatar,
        users::subscribe,
        users::unsubscribe,
        users::list_subscriptions,
        // Catalog endpoints
        tags::list_tags,
        tags::get_tag,
        ingredients::list_ingredients,
        ingredients::get_ingredient,
        // Recipe endpoints
        recipes::list_recipes,
        recipes::get_recipe,
        recipes::create_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::get_short_link,
        recipes::favorite,
        recipes::unfavorite,
        recipes::add_to_shopping_cart,
        recipes::remove_from_shopping_cart,
        recipes::download_shopping_cart,
        // Short link redirect
        links::redirect_short_link,
    ),
    components(schemas(
        // Auth schemas
        SignupRequest,
        LoginRequest,
        AuthResponse,
        UserResponse,
        // User schemas
        SetAvatarRequest,
        AvatarResponse,
        SubscriptionResponse,
        // Catalog schemas
        TagResponse,
        IngredientResponse,
        // Recipe schemas
        CreateRecipeRequest,
        UpdateRecipeRequest,
        RecipeIngredientInput,
        RecipeIngredientResponse,
        RecipeResponse,
        RecipeShortResponse,
        ShortLinkResponse,
        // Query schemas
        users::UserQuery,
        users::SubscriptionQuery,
        ingredients::IngredientQuery,
        recipes::RecipeQuery,
    )),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User profiles and subscriptions"),
        (name = "tags", description = "Tag catalog (read-only)"),
        (name = "ingredients", description = "Ingredient catalog (read-only)"),
        (name = "recipes", description = "Recipe management, favorites, shopping cart"),
        (name = "links", description = "Short link redirects"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

use utoipa::Modify;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
