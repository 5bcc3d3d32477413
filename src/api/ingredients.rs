use crate::db::DbPool;
use crate::entities::ingredient;
use crate::error::ApiError;
use crate::models::IngredientResponse;
use actix_web::{web, HttpResponse, Result as ActixResult};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct IngredientQuery {
    /// Case-insensitive substring match on the ingredient name.
    #[schema(example = "salt")]
    pub name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    params(
        ("name" = Option<String>, Query, description = "Filter by name substring")
    ),
    responses(
        (status = 200, description = "List of ingredients", body = Vec<IngredientResponse>)
    ),
    tag = "ingredients"
)]
pub async fn list_ingredients(
    pool: web::Data<DbPool>,
    query: web::Query<IngredientQuery>,
) -> ActixResult<HttpResponse> {
    let mut select = ingredient::Entity::find().order_by_asc(ingredient::Column::Name);
    if let Some(name) = &query.name {
        if !name.is_empty() {
            select = select.filter(ingredient::Column::Name.contains(name));
        }
    }

    let ingredients = select.all(pool.get_ref()).await.map_err(ApiError::from)?;

    let ingredients: Vec<IngredientResponse> = ingredients
        .into_iter()
        .map(IngredientResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(ingredients))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{ingredient_id}",
    params(
        ("ingredient_id" = i64, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Ingredient detail", body = IngredientResponse),
        (status = 404, description = "Ingredient not found")
    ),
    tag = "ingredients"
)]
pub async fn get_ingredient(
    path: web::Path<i64>,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let ingredient_id = path.into_inner();

    let ingredient = ingredient::Entity::find_by_id(ingredient_id)
        .one(pool.get_ref())
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("Ingredient not found".to_string()))?;

    Ok(HttpResponse::Ok().json(IngredientResponse::from(ingredient)))
}
