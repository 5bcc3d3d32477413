use crate::db::DbPool;
use crate::entities::recipe;
use crate::error::ApiError;
use actix_web::{web, HttpResponse, Result as ActixResult};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

#[utoipa::path(
    get,
    path = "/s/{code}",
    params(
        ("code" = String, Path, description = "Recipe short code")
    ),
    responses(
        (status = 307, description = "Redirect to the recipe detail endpoint"),
        (status = 404, description = "Unknown short code")
    ),
    tag = "links"
)]
pub async fn redirect_short_link(
    path: web::Path<String>,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let code = path.into_inner();

    let recipe = recipe::Entity::find()
        .filter(recipe::Column::ShortCode.eq(&code))
        .one(pool.get_ref())
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("Unknown short link".to_string()))?;

    Ok(HttpResponse::TemporaryRedirect()
        .append_header(("Location", format!("/api/recipes/{}", recipe.id)))
        .finish())
}
