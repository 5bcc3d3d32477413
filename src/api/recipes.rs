use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::entities::{
    favorite, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart_item, tag, user,
};
use crate::error::ApiError;
use crate::models::{
    CreateRecipeRequest, RecipeIngredientInput, RecipeIngredientResponse, RecipeResponse,
    RecipeShortResponse, ShortLinkResponse, TagResponse, UpdateRecipeRequest, UserResponse,
};
use crate::services::media::{delete_media_file, save_data_url_image};
use crate::services::relations::{is_favorited, is_following, is_in_shopping_cart};
use crate::services::shopping_list::{aggregate_cart, render_shopping_list, CartRow};
use crate::services::short_link::generate_short_code;
use crate::services::validation::validate_recipe_write;
use actix_web::{web, HttpResponse, Result as ActixResult};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RecipeQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 20)]
    pub limit: Option<u64>,
    /// Filter by author id.
    pub author: Option<i64>,
    /// Comma-separated tag slugs; a recipe matches if it carries any of them.
    #[schema(example = "breakfast,dinner")]
    pub tags: Option<String>,
    /// Only recipes the caller favorited (ignored for anonymous callers).
    pub is_favorited: Option<bool>,
    /// Only recipes in the caller's shopping cart (ignored for anonymous callers).
    pub is_in_shopping_cart: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("author" = Option<i64>, Query, description = "Filter by author id"),
        ("tags" = Option<String>, Query, description = "Comma-separated tag slugs"),
        ("is_favorited" = Option<bool>, Query, description = "Only favorited recipes"),
        ("is_in_shopping_cart" = Option<bool>, Query, description = "Only recipes in the cart")
    ),
    responses(
        (status = 200, description = "List of recipes", body = Vec<RecipeResponse>)
    ),
    tag = "recipes"
)]
pub async fn list_recipes(
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    query: web::Query<RecipeQuery>,
) -> ActixResult<HttpResponse> {
    let viewer_id = viewer.map(|v| v.user_id);

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);
    let offset = (page.saturating_sub(1)) * limit;

    let mut select = recipe::Entity::find().order_by_desc(recipe::Column::CreatedAt);

    if let Some(author) = query.author {
        select = select.filter(recipe::Column::AuthorId.eq(author));
    }

    if let Some(tags) = &query.tags {
        let slugs: Vec<&str> = tags.split(',').filter(|s| !s.is_empty()).collect();
        if !slugs.is_empty() {
            let tag_ids: Vec<i64> = tag::Entity::find()
                .filter(tag::Column::Slug.is_in(slugs))
                .all(pool.get_ref())
                .await
                .map_err(ApiError::from)?
                .into_iter()
                .map(|t| t.id)
                .collect();
            let recipe_ids =
                recipe_ids_for_tags(pool.get_ref(), &tag_ids).await.map_err(ApiError::from)?;
            if recipe_ids.is_empty() {
                return Ok(HttpResponse::Ok().json(Vec::<RecipeResponse>::new()));
            }
            select = select.filter(recipe::Column::Id.is_in(recipe_ids));
        }
    }

    if let (Some(true), Some(viewer_id)) = (query.is_favorited, viewer_id) {
        let ids: Vec<i64> = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(viewer_id))
            .all(pool.get_ref())
            .await
            .map_err(ApiError::from)?
            .into_iter()
            .map(|f| f.recipe_id)
            .collect();
        if ids.is_empty() {
            return Ok(HttpResponse::Ok().json(Vec::<RecipeResponse>::new()));
        }
        select = select.filter(recipe::Column::Id.is_in(ids));
    }

    if let (Some(true), Some(viewer_id)) = (query.is_in_shopping_cart, viewer_id) {
        let ids: Vec<i64> = shopping_cart_item::Entity::find()
            .filter(shopping_cart_item::Column::UserId.eq(viewer_id))
            .all(pool.get_ref())
            .await
            .map_err(ApiError::from)?
            .into_iter()
            .map(|item| item.recipe_id)
            .collect();
        if ids.is_empty() {
            return Ok(HttpResponse::Ok().json(Vec::<RecipeResponse>::new()));
        }
        select = select.filter(recipe::Column::Id.is_in(ids));
    }

    let recipes = select
        .limit(limit)
        .offset(offset)
        .all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    let mut responses = Vec::new();
    for recipe in recipes {
        responses.push(build_recipe_response(pool.get_ref(), &recipe, viewer_id).await?);
    }

    Ok(HttpResponse::Ok().json(responses))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{recipe_id}",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe detail", body = RecipeResponse),
        (status = 404, description = "Recipe not found")
    ),
    tag = "recipes"
)]
pub async fn get_recipe(
    path: web::Path<i64>,
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let recipe = find_recipe(pool.get_ref(), path.into_inner()).await?;
    let viewer_id = viewer.map(|v| v.user_id);
    let response = build_recipe_response(pool.get_ref(), &recipe, viewer_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn create_recipe(
    req: web::Json<CreateRecipeRequest>,
    author: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ActixResult<HttpResponse> {
    let known = known_ingredient_ids(pool.get_ref(), &req.ingredients).await?;
    validate_recipe_write(
        &req.ingredients,
        &req.tags,
        req.image.as_deref(),
        req.cooking_time,
        &known,
    )?;
    check_tags_exist(pool.get_ref(), &req.tags).await?;

    let image = req.image.as_deref().unwrap_or_default();
    let image_url = save_data_url_image(&config.media.root, "recipe/image", image)?;

    let txn = pool.get_ref().begin().await.map_err(ApiError::from)?;

    let new_recipe = recipe::ActiveModel {
        author_id: sea_orm::Set(author.user_id),
        name: sea_orm::Set(req.name.clone()),
        image: sea_orm::Set(image_url),
        text: sea_orm::Set(req.text.clone()),
        cooking_time: sea_orm::Set(req.cooking_time),
        short_code: sea_orm::Set(generate_short_code()),
        ..Default::default()
    };
    let recipe = recipe::Entity::insert(new_recipe)
        .exec_with_returning(&txn)
        .await
        .map_err(ApiError::from)?;

    replace_recipe_relations(&txn, recipe.id, &req.ingredients, &req.tags).await?;

    txn.commit().await.map_err(ApiError::from)?;

    let response = build_recipe_response(pool.get_ref(), &recipe, Some(author.user_id)).await?;
    Ok(HttpResponse::Created().json(response))
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{recipe_id}",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn update_recipe(
    path: web::Path<i64>,
    req: web::Json<UpdateRecipeRequest>,
    viewer: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ActixResult<HttpResponse> {
    let recipe = find_recipe(pool.get_ref(), path.into_inner()).await?;
    if recipe.author_id != viewer.user_id {
        return Err(ApiError::Forbidden("Only the author may edit a recipe".to_string()).into());
    }

    // Merge the patch over the stored state, then validate the merged result
    // with the same rules as create.
    let ingredients_eff: Vec<RecipeIngredientInput> = match &req.ingredients {
        Some(list) => list.clone(),
        None => recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id))
            .all(pool.get_ref())
            .await
            .map_err(ApiError::from)?
            .into_iter()
            .map(|row| RecipeIngredientInput {
                id: row.ingredient_id,
                amount: row.amount,
            })
            .collect(),
    };
    let tags_eff: Vec<i64> = match &req.tags {
        Some(list) => list.clone(),
        None => recipe_tag::Entity::find()
            .filter(recipe_tag::Column::RecipeId.eq(recipe.id))
            .all(pool.get_ref())
            .await
            .map_err(ApiError::from)?
            .into_iter()
            .map(|row| row.tag_id)
            .collect(),
    };
    let image_eff = req.image.as_deref().unwrap_or(recipe.image.as_str());
    let cooking_time_eff = req.cooking_time.unwrap_or(recipe.cooking_time);

    let known = known_ingredient_ids(pool.get_ref(), &ingredients_eff).await?;
    validate_recipe_write(
        &ingredients_eff,
        &tags_eff,
        Some(image_eff),
        cooking_time_eff,
        &known,
    )?;
    if req.tags.is_some() {
        check_tags_exist(pool.get_ref(), &tags_eff).await?;
    }

    let old_image = recipe.image.clone();
    let new_image_url = match &req.image {
        Some(data_url) => Some(save_data_url_image(
            &config.media.root,
            "recipe/image",
            data_url,
        )?),
        None => None,
    };

    let txn = pool.get_ref().begin().await.map_err(ApiError::from)?;

    // Scalars are written unconditionally with their merged values, so a
    // lists-only patch still produces a well-formed UPDATE.
    let mut active: recipe::ActiveModel = recipe.clone().into();
    active.name = sea_orm::Set(req.name.clone().unwrap_or_else(|| recipe.name.clone()));
    active.text = sea_orm::Set(req.text.clone().unwrap_or_else(|| recipe.text.clone()));
    active.cooking_time = sea_orm::Set(cooking_time_eff);
    if let Some(url) = &new_image_url {
        active.image = sea_orm::Set(url.clone());
    }
    let updated = sea_orm::ActiveModelTrait::update(active, &txn)
        .await
        .map_err(ApiError::from)?;

    if req.ingredients.is_some() || req.tags.is_some() {
        clear_recipe_relations(&txn, recipe.id, req.ingredients.is_some(), req.tags.is_some())
            .await?;
        let ingredients = req.ingredients.as_deref().unwrap_or(&[]);
        let tags = req.tags.as_deref().unwrap_or(&[]);
        insert_recipe_relations(&txn, recipe.id, ingredients, tags).await?;
    }

    txn.commit().await.map_err(ApiError::from)?;

    if new_image_url.is_some() {
        delete_media_file(&config.media.root, &old_image);
    }

    let response = build_recipe_response(pool.get_ref(), &updated, Some(viewer.user_id)).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn delete_recipe(
    path: web::Path<i64>,
    viewer: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ActixResult<HttpResponse> {
    let recipe = find_recipe(pool.get_ref(), path.into_inner()).await?;
    if recipe.author_id != viewer.user_id {
        return Err(ApiError::Forbidden("Only the author may delete a recipe".to_string()).into());
    }

    let image = recipe.image.clone();
    recipe::Entity::delete_by_id(recipe.id)
        .exec(pool.get_ref())
        .await
        .map_err(ApiError::from)?;
    delete_media_file(&config.media.root, &image);

    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/recipes/{recipe_id}/get-link",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Short link for the recipe", body = ShortLinkResponse),
        (status = 404, description = "Recipe not found")
    ),
    tag = "recipes"
)]
pub async fn get_short_link(
    path: web::Path<i64>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ActixResult<HttpResponse> {
    let recipe = find_recipe(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ShortLinkResponse {
        short_link: format!("{}/s/{}", config.server.base_url, recipe.short_code),
    }))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{recipe_id}/favorite",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Recipe favorited", body = RecipeShortResponse),
        (status = 400, description = "Already favorited or unknown recipe"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn favorite(
    path: web::Path<i64>,
    viewer: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    add_to_list(
        pool.get_ref(),
        UserRecipeList::Favorites,
        viewer.user_id,
        path.into_inner(),
    )
    .await
    .map_err(Into::into)
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}/favorite",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe unfavorited"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe was not favorited")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn unfavorite(
    path: web::Path<i64>,
    viewer: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    remove_from_list(
        pool.get_ref(),
        UserRecipeList::Favorites,
        viewer.user_id,
        path.into_inner(),
    )
    .await
    .map_err(Into::into)
}

#[utoipa::path(
    post,
    path = "/api/recipes/{recipe_id}/shopping_cart",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Recipe added to the cart", body = RecipeShortResponse),
        (status = 400, description = "Already in the cart or unknown recipe"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn add_to_shopping_cart(
    path: web::Path<i64>,
    viewer: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    add_to_list(
        pool.get_ref(),
        UserRecipeList::ShoppingCart,
        viewer.user_id,
        path.into_inner(),
    )
    .await
    .map_err(Into::into)
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}/shopping_cart",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe removed from the cart"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe was not in the cart")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn remove_from_shopping_cart(
    path: web::Path<i64>,
    viewer: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    remove_from_list(
        pool.get_ref(),
        UserRecipeList::ShoppingCart,
        viewer.user_id,
        path.into_inner(),
    )
    .await
    .map_err(Into::into)
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    responses(
        (status = 200, description = "Plain-text shopping list attachment"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn download_shopping_cart(
    viewer: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let cart_items = shopping_cart_item::Entity::find()
        .filter(shopping_cart_item::Column::UserId.eq(viewer.user_id))
        .order_by_asc(shopping_cart_item::Column::CreatedAt)
        .all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    let mut rows: Vec<CartRow> = Vec::new();
    for item in cart_items {
        let recipe = match recipe::Entity::find_by_id(item.recipe_id)
            .one(pool.get_ref())
            .await
            .map_err(ApiError::from)?
        {
            Some(recipe) => recipe,
            None => continue,
        };
        let parts = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id))
            .find_also_related(ingredient::Entity)
            .all(pool.get_ref())
            .await
            .map_err(ApiError::from)?;
        for (part, ingredient) in parts {
            let ingredient = match ingredient {
                Some(ingredient) => ingredient,
                None => continue,
            };
            rows.push(CartRow {
                recipe_name: recipe.name.clone(),
                ingredient_id: ingredient.id,
                ingredient_name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount: part.amount as i64,
            });
        }
    }

    let (ingredients, recipe_names) = aggregate_cart(&rows);
    let today = Utc::now().date_naive();
    let text = render_shopping_list(&ingredients, &recipe_names, today);

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .append_header((
            "Content-Disposition",
            format!("attachment; filename=\"shopping_cart_{}.txt\"", today),
        ))
        .body(text))
}

enum UserRecipeList {
    Favorites,
    ShoppingCart,
}

impl UserRecipeList {
    fn already_msg(&self) -> &'static str {
        match self {
            UserRecipeList::Favorites => "Recipe is already in your favorites",
            UserRecipeList::ShoppingCart => "Recipe is already in your shopping cart",
        }
    }

    fn missing_msg(&self) -> &'static str {
        match self {
            UserRecipeList::Favorites => "Recipe is not in your favorites",
            UserRecipeList::ShoppingCart => "Recipe is not in your shopping cart",
        }
    }
}

/// Strict add: a duplicate is an error, not a no-op, and an unknown recipe is
/// a validation error on the add direction.
async fn add_to_list(
    db: &DbPool,
    list: UserRecipeList,
    user_id: i64,
    recipe_id: i64,
) -> Result<HttpResponse, ApiError> {
    let recipe = recipe::Entity::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::Validation("Recipe not found".to_string()))?;

    let exists = match list {
        UserRecipeList::Favorites => is_favorited(db, user_id, recipe_id).await?,
        UserRecipeList::ShoppingCart => is_in_shopping_cart(db, user_id, recipe_id).await?,
    };
    if exists {
        return Err(ApiError::Conflict(list.already_msg().to_string()));
    }

    match list {
        UserRecipeList::Favorites => {
            favorite::Entity::insert(favorite::ActiveModel {
                user_id: sea_orm::Set(user_id),
                recipe_id: sea_orm::Set(recipe_id),
                ..Default::default()
            })
            .exec(db)
            .await
            .map_err(|e| ApiError::from_insert_err(e, list.already_msg()))?;
        }
        UserRecipeList::ShoppingCart => {
            shopping_cart_item::Entity::insert(shopping_cart_item::ActiveModel {
                user_id: sea_orm::Set(user_id),
                recipe_id: sea_orm::Set(recipe_id),
                ..Default::default()
            })
            .exec(db)
            .await
            .map_err(|e| ApiError::from_insert_err(e, list.already_msg()))?;
        }
    };

    Ok(HttpResponse::Created().json(RecipeShortResponse::from(&recipe)))
}

async fn remove_from_list(
    db: &DbPool,
    list: UserRecipeList,
    user_id: i64,
    recipe_id: i64,
) -> Result<HttpResponse, ApiError> {
    let result = match list {
        UserRecipeList::Favorites => {
            favorite::Entity::delete_many()
                .filter(
                    Condition::all()
                        .add(favorite::Column::UserId.eq(user_id))
                        .add(favorite::Column::RecipeId.eq(recipe_id)),
                )
                .exec(db)
                .await?
        }
        UserRecipeList::ShoppingCart => {
            shopping_cart_item::Entity::delete_many()
                .filter(
                    Condition::all()
                        .add(shopping_cart_item::Column::UserId.eq(user_id))
                        .add(shopping_cart_item::Column::RecipeId.eq(recipe_id)),
                )
                .exec(db)
                .await?
        }
    };

    if result.rows_affected == 0 {
        return Err(ApiError::NotFound(list.missing_msg().to_string()));
    }

    Ok(HttpResponse::NoContent().finish())
}

async fn find_recipe(db: &DbPool, recipe_id: i64) -> Result<recipe::Model, ApiError> {
    recipe::Entity::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))
}

/// Catalog ids present among the payload's references; validation names the
/// first id missing from this set.
async fn known_ingredient_ids(
    db: &DbPool,
    ingredients: &[RecipeIngredientInput],
) -> Result<HashSet<i64>, ApiError> {
    let ids: Vec<i64> = ingredients.iter().map(|i| i.id).collect();
    if ids.is_empty() {
        return Ok(HashSet::new());
    }
    let known = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();
    Ok(known)
}

async fn check_tags_exist(db: &DbPool, tags: &[i64]) -> Result<(), ApiError> {
    if tags.is_empty() {
        return Ok(());
    }
    let known: HashSet<i64> = tag::Entity::find()
        .filter(tag::Column::Id.is_in(tags.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    for tag_id in tags {
        if !known.contains(tag_id) {
            return Err(ApiError::Validation(format!("Tag {} does not exist", tag_id)));
        }
    }
    Ok(())
}

async fn insert_recipe_relations(
    db: &impl ConnectionTrait,
    recipe_id: i64,
    ingredients: &[RecipeIngredientInput],
    tags: &[i64],
) -> Result<(), ApiError> {
    if !ingredients.is_empty() {
        let rows: Vec<recipe_ingredient::ActiveModel> = ingredients
            .iter()
            .map(|input| recipe_ingredient::ActiveModel {
                recipe_id: sea_orm::Set(recipe_id),
                ingredient_id: sea_orm::Set(input.id),
                amount: sea_orm::Set(input.amount),
                ..Default::default()
            })
            .collect();
        recipe_ingredient::Entity::insert_many(rows).exec(db).await?;
    }
    if !tags.is_empty() {
        let rows: Vec<recipe_tag::ActiveModel> = tags
            .iter()
            .map(|tag_id| recipe_tag::ActiveModel {
                recipe_id: sea_orm::Set(recipe_id),
                tag_id: sea_orm::Set(*tag_id),
                ..Default::default()
            })
            .collect();
        recipe_tag::Entity::insert_many(rows).exec(db).await?;
    }
    Ok(())
}

async fn clear_recipe_relations(
    db: &impl ConnectionTrait,
    recipe_id: i64,
    ingredients: bool,
    tags: bool,
) -> Result<(), ApiError> {
    if ingredients {
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(db)
            .await?;
    }
    if tags {
        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
            .exec(db)
            .await?;
    }
    Ok(())
}

async fn replace_recipe_relations(
    db: &impl ConnectionTrait,
    recipe_id: i64,
    ingredients: &[RecipeIngredientInput],
    tags: &[i64],
) -> Result<(), ApiError> {
    clear_recipe_relations(db, recipe_id, true, true).await?;
    insert_recipe_relations(db, recipe_id, ingredients, tags).await
}

async fn recipe_ids_for_tags(db: &DbPool, tag_ids: &[i64]) -> Result<Vec<i64>, sea_orm::DbErr> {
    if tag_ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::TagId.is_in(tag_ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.recipe_id)
        .collect();
    Ok(ids)
}

/// Full read view: author with the viewer's follow state, the ingredient
/// quantities joined with the catalog, tags, and the viewer's list flags.
async fn build_recipe_response(
    db: &DbPool,
    recipe: &recipe::Model,
    viewer_id: Option<i64>,
) -> Result<RecipeResponse, ApiError> {
    let author = user::Entity::find_by_id(recipe.author_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe author not found".to_string()))?;

    let is_subscribed = match viewer_id {
        Some(viewer_id) => is_following(db, viewer_id, author.id).await?,
        None => false,
    };

    let ingredients = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id))
        .find_also_related(ingredient::Entity)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(part, ingredient)| {
            ingredient.map(|ingredient| RecipeIngredientResponse {
                id: ingredient.id,
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount: part.amount,
            })
        })
        .collect();

    let tags = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.eq(recipe.id))
        .find_also_related(tag::Entity)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(_, tag)| tag.map(TagResponse::from))
        .collect();

    let (is_favorited, is_in_shopping_cart) = match viewer_id {
        Some(viewer_id) => (
            crate::services::relations::is_favorited(db, viewer_id, recipe.id).await?,
            crate::services::relations::is_in_shopping_cart(db, viewer_id, recipe.id).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeResponse {
        id: recipe.id,
        tags,
        author: UserResponse::from_model(&author, is_subscribed),
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name.clone(),
        image: recipe.image.clone(),
        text: recipe.text.clone(),
        cooking_time: recipe.cooking_time,
    })
}
