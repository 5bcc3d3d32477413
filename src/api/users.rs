use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::entities::{recipe, subscription, user};
use crate::error::ApiError;
use crate::models::{
    AvatarResponse, RecipeShortResponse, SetAvatarRequest, SubscriptionResponse, UserResponse,
};
use crate::services::media::{delete_media_file, save_data_url_image};
use crate::services::relations::is_following;
use actix_web::{web, HttpResponse, Result as ActixResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::Deserialize;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UserQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 20)]
    pub limit: Option<u64>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubscriptionQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 20)]
    pub limit: Option<u64>,
    /// Cap on the number of recipes returned per followed author.
    #[schema(example = 3)]
    pub recipes_limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)")
    ),
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>)
    ),
    tag = "users"
)]
pub async fn list_users(
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    query: web::Query<UserQuery>,
) -> ActixResult<HttpResponse> {
    let viewer_id = viewer.map(|v| v.user_id);

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);
    let offset = (page.saturating_sub(1)) * limit;

    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .limit(limit)
        .offset(offset)
        .all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    let mut responses = Vec::new();
    for user in users {
        let is_subscribed = match viewer_id {
            Some(viewer_id) => is_following(pool.get_ref(), viewer_id, user.id)
                .await
                .map_err(ApiError::from)?,
            None => false,
        };
        responses.push(UserResponse::from_model(&user, is_subscribed));
    }

    Ok(HttpResponse::Ok().json(responses))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn me(viewer: AuthenticatedUser, pool: web::Data<DbPool>) -> ActixResult<HttpResponse> {
    let user = user::Entity::find_by_id(viewer.user_id)
        .one(pool.get_ref())
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse::from_model(&user, false)))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    path: web::Path<i64>,
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let user_id = path.into_inner();

    let user = user::Entity::find_by_id(user_id)
        .one(pool.get_ref())
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let is_subscribed = match viewer {
        Some(viewer) => is_following(pool.get_ref(), viewer.user_id, user.id)
            .await
            .map_err(ApiError::from)?,
        None => false,
    };

    Ok(HttpResponse::Ok().json(UserResponse::from_model(&user, is_subscribed)))
}

#[utoipa::path(
    put,
    path = "/api/users/me/avatar",
    request_body = SetAvatarRequest,
    responses(
        (status = 200, description = "Avatar updated", body = AvatarResponse),
        (status = 400, description = "Invalid image payload"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn set_avatar(
    req: web::Json<SetAvatarRequest>,
    viewer: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ActixResult<HttpResponse> {
    let user = user::Entity::find_by_id(viewer.user_id)
        .one(pool.get_ref())
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let url = save_data_url_image(&config.media.root, "avatar/image", &req.avatar)?;

    if let Some(old) = &user.avatar {
        delete_media_file(&config.media.root, old);
    }

    let mut active: user::ActiveModel = user.into();
    active.avatar = sea_orm::Set(Some(url.clone()));
    active.update(pool.get_ref()).await.map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(AvatarResponse { avatar: url }))
}

#[utoipa::path(
    delete,
    path = "/api/users/me/avatar",
    responses(
        (status = 204, description = "Avatar removed"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn delete_avatar(
    viewer: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ActixResult<HttpResponse> {
    let user = user::Entity::find_by_id(viewer.user_id)
        .one(pool.get_ref())
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if let Some(old) = user.avatar.clone() {
        delete_media_file(&config.media.root, &old);
        let mut active: user::ActiveModel = user.into();
        active.avatar = sea_orm::Set(None);
        active.update(pool.get_ref()).await.map_err(ApiError::from)?;
    }

    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/subscribe",
    params(
        ("user_id" = i64, Path, description = "Author to follow"),
        ("recipes_limit" = Option<u64>, Query, description = "Cap on recipes in the response")
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Self-follow or already subscribed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn subscribe(
    path: web::Path<i64>,
    viewer: AuthenticatedUser,
    pool: web::Data<DbPool>,
    query: web::Query<SubscriptionQuery>,
) -> ActixResult<HttpResponse> {
    let author_id = path.into_inner();

    let author = user::Entity::find_by_id(author_id)
        .one(pool.get_ref())
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if author.id == viewer.user_id {
        return Err(ApiError::Validation("You cannot subscribe to yourself".to_string()).into());
    }

    if is_following(pool.get_ref(), viewer.user_id, author.id)
        .await
        .map_err(ApiError::from)?
    {
        return Err(
            ApiError::Conflict("You are already subscribed to this user".to_string()).into(),
        );
    }

    subscription::Entity::insert(subscription::ActiveModel {
        user_id: sea_orm::Set(viewer.user_id),
        author_id: sea_orm::Set(author.id),
        ..Default::default()
    })
    .exec(pool.get_ref())
    .await
    .map_err(|e| ApiError::from_insert_err(e, "You are already subscribed to this user"))?;

    let view = subscription_view(pool.get_ref(), &author, query.recipes_limit).await?;
    Ok(HttpResponse::Created().json(view))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/subscribe",
    params(
        ("user_id" = i64, Path, description = "Author to unfollow")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Subscription does not exist")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn unsubscribe(
    path: web::Path<i64>,
    viewer: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let author_id = path.into_inner();

    let result = subscription::Entity::delete_many()
        .filter(
            Condition::all()
                .add(subscription::Column::UserId.eq(viewer.user_id))
                .add(subscription::Column::AuthorId.eq(author_id)),
        )
        .exec(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    if result.rows_affected == 0 {
        return Err(ApiError::NotFound("Subscription does not exist".to_string()).into());
    }

    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("recipes_limit" = Option<u64>, Query, description = "Cap on recipes per author")
    ),
    responses(
        (status = 200, description = "Followed authors", body = Vec<SubscriptionResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn list_subscriptions(
    viewer: AuthenticatedUser,
    pool: web::Data<DbPool>,
    query: web::Query<SubscriptionQuery>,
) -> ActixResult<HttpResponse> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);
    let offset = (page.saturating_sub(1)) * limit;

    let edges = subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(viewer.user_id))
        .order_by_asc(subscription::Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    let mut responses = Vec::new();
    for edge in edges {
        let author = match user::Entity::find_by_id(edge.author_id)
            .one(pool.get_ref())
            .await
            .map_err(ApiError::from)?
        {
            Some(author) => author,
            None => {
                log::warn!("Subscription {} points at a missing author", edge.id);
                continue;
            }
        };
        responses.push(subscription_view(pool.get_ref(), &author, query.recipes_limit).await?);
    }

    Ok(HttpResponse::Ok().json(responses))
}

/// Author profile plus recipe count and a capped recipe slice, as shown in
/// subscription listings. The caller only reaches this while subscribed, so
/// `is_subscribed` is always true.
async fn subscription_view(
    db: &DbPool,
    author: &user::Model,
    recipes_limit: Option<u64>,
) -> Result<SubscriptionResponse, ApiError> {
    let recipes_count = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(author.id))
        .count(db)
        .await?;

    let mut select = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(author.id))
        .order_by_desc(recipe::Column::CreatedAt);
    if let Some(limit) = recipes_limit {
        select = select.limit(limit);
    }
    let recipes = select.all(db).await?;

    Ok(SubscriptionResponse {
        id: author.id,
        email: author.email.clone(),
        username: author.username.clone(),
        first_name: author.first_name.clone(),
        last_name: author.last_name.clone(),
        is_subscribed: true,
        avatar: author.avatar.clone(),
        recipes: recipes.iter().map(RecipeShortResponse::from).collect(),
        recipes_count,
    })
}
