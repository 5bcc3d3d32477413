use crate::config::Config;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

pub type DbPool = DatabaseConnection;

pub async fn create_mysql_pool(config: &Config) -> Result<DbPool, anyhow::Error> {
    let url = config.mysql_url();
    let db = Database::connect(&url).await?;

    // Schema bootstrap with raw SQL; every uniqueness rule the API relies on
    // is a UNIQUE KEY here so concurrent duplicate inserts fail in the
    // database, not just in the pre-insert existence checks.
    let sql = r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            email VARCHAR(254) UNIQUE NOT NULL,
            username VARCHAR(150) UNIQUE NOT NULL,
            first_name VARCHAR(150) NOT NULL,
            last_name VARCHAR(150) NOT NULL,
            password_hash VARCHAR(255) NOT NULL,
            avatar VARCHAR(255) NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS subscriptions (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            user_id BIGINT NOT NULL,
            author_id BIGINT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE KEY unique_user_author (user_id, author_id),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE,
            INDEX idx_subscription_user (user_id)
        );

        CREATE TABLE IF NOT EXISTS tags (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(32) UNIQUE NOT NULL,
            slug VARCHAR(32) UNIQUE NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ingredients (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(128) NOT NULL,
            measurement_unit VARCHAR(64) NOT NULL,
            UNIQUE KEY unique_name_unit (name, measurement_unit),
            INDEX idx_ingredient_name (name)
        );

        CREATE TABLE IF NOT EXISTS recipes (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            author_id BIGINT NOT NULL,
            name VARCHAR(256) NOT NULL,
            image VARCHAR(255) NOT NULL,
            text TEXT NOT NULL,
            cooking_time INT NOT NULL,
            short_code CHAR(10) UNIQUE NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE,
            INDEX idx_recipe_author (author_id),
            INDEX idx_recipe_created_at (created_at)
        );

        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            recipe_id BIGINT NOT NULL,
            ingredient_id BIGINT NOT NULL,
            amount INT NOT NULL,
            UNIQUE KEY unique_recipe_ingredient (recipe_id, ingredient_id),
            FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
            FOREIGN KEY (ingredient_id) REFERENCES ingredients(id) ON DELETE CASCADE,
            INDEX idx_ri_recipe (recipe_id)
        );

        CREATE TABLE IF NOT EXISTS recipe_tags (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            recipe_id BIGINT NOT NULL,
            tag_id BIGINT NOT NULL,
            UNIQUE KEY unique_recipe_tag (recipe_id, tag_id),
            FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
            FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE,
            INDEX idx_rt_recipe (recipe_id)
        );

        CREATE TABLE IF NOT EXISTS favorites (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            user_id BIGINT NOT NULL,
            recipe_id BIGINT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE KEY unique_favorite (user_id, recipe_id),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
            INDEX idx_favorite_user (user_id)
        );

        CREATE TABLE IF NOT EXISTS shopping_cart_items (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            user_id BIGINT NOT NULL,
            recipe_id BIGINT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE KEY unique_cart_item (user_id, recipe_id),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
            INDEX idx_cart_user (user_id)
        );
    "#;

    for statement in sql.split(';') {
        let statement = statement.trim();
        if !statement.is_empty() {
            let stmt = sea_orm::Statement::from_string(
                sea_orm::DatabaseBackend::MySql,
                statement.to_string(),
            );
            db.execute(stmt).await?;
        }
    }

    Ok(db)
}
