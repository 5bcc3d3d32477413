use crate::entities::{favorite, shopping_cart_item, subscription};
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

/// Does `follower_id` follow `author_id`?
pub async fn is_following(
    db: &impl ConnectionTrait,
    follower_id: i64,
    author_id: i64,
) -> Result<bool, DbErr> {
    let edge = subscription::Entity::find()
        .filter(
            Condition::all()
                .add(subscription::Column::UserId.eq(follower_id))
                .add(subscription::Column::AuthorId.eq(author_id)),
        )
        .one(db)
        .await?;
    Ok(edge.is_some())
}

pub async fn is_favorited(
    db: &impl ConnectionTrait,
    user_id: i64,
    recipe_id: i64,
) -> Result<bool, DbErr> {
    let row = favorite::Entity::find()
        .filter(
            Condition::all()
                .add(favorite::Column::UserId.eq(user_id))
                .add(favorite::Column::RecipeId.eq(recipe_id)),
        )
        .one(db)
        .await?;
    Ok(row.is_some())
}

pub async fn is_in_shopping_cart(
    db: &impl ConnectionTrait,
    user_id: i64,
    recipe_id: i64,
) -> Result<bool, DbErr> {
    let row = shopping_cart_item::Entity::find()
        .filter(
            Condition::all()
                .add(shopping_cart_item::Column::UserId.eq(user_id))
                .add(shopping_cart_item::Column::RecipeId.eq(recipe_id)),
        )
        .one(db)
        .await?;
    Ok(row.is_some())
}
