use crate::db::DbPool;
use crate::entities::tag;
use crate::error::ApiError;
use crate::models::TagResponse;
use actix_web::{web, HttpResponse, Result as ActixResult};
use sea_orm::{EntityTrait, QueryOrder};

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "List of tags", body = Vec<TagResponse>)
    ),
    tag = "tags"
)]
pub async fn list_tags(pool: web::Data<DbPool>) -> ActixResult<HttpResponse> {
    let tags = tag::Entity::find()
        .order_by_asc(tag::Column::Name)
        .all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    let tags: Vec<TagResponse> = tags.into_iter().map(TagResponse::from).collect();
    Ok(HttpResponse::Ok().json(tags))
}

#[utoipa::path(
    get,
    path = "/api/tags/{tag_id}",
    params(
        ("tag_id" = i64, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Tag detail", body = TagResponse),
        (status = 404, description = "Tag not found")
    ),
    tag = "tags"
)]
pub async fn get_tag(path: web::Path<i64>, pool: web::Data<DbPool>) -> ActixResult<HttpResponse> {
    let tag_id = path.into_inner();

    let tag = tag::Entity::find_by_id(tag_id)
        .one(pool.get_ref())
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    Ok(HttpResponse::Ok().json(TagResponse::from(tag)))
}
