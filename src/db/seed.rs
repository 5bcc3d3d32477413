use crate::config::Config;
use crate::db::DbPool;
use crate::entities::{ingredient, tag};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct IngredientSeed {
    name: String,
    measurement_unit: String,
}

#[derive(Debug, Deserialize)]
struct TagSeed {
    name: String,
    slug: String,
}

/// Imports the catalog JSON files named in the config, if any. Rows already
/// present are skipped so the import can run on every startup.
pub async fn import_catalogs(config: &Config, pool: &DbPool) -> Result<(), anyhow::Error> {
    if let Some(path) = &config.seed.ingredients_file {
        import_ingredients(path, pool).await?;
    }
    if let Some(path) = &config.seed.tags_file {
        import_tags(path, pool).await?;
    }
    Ok(())
}

async fn import_ingredients(path: &str, pool: &DbPool) -> Result<(), anyhow::Error> {
    let data = std::fs::read_to_string(path)?;
    let seeds: Vec<IngredientSeed> = serde_json::from_str(&data)?;
    let total = seeds.len();

    let mut created = 0;
    for seed in seeds {
        let existing = ingredient::Entity::find()
            .filter(
                Condition::all()
                    .add(ingredient::Column::Name.eq(&seed.name))
                    .add(ingredient::Column::MeasurementUnit.eq(&seed.measurement_unit)),
            )
            .one(pool)
            .await?;
        if existing.is_some() {
            continue;
        }
        ingredient::Entity::insert(ingredient::ActiveModel {
            name: sea_orm::Set(seed.name),
            measurement_unit: sea_orm::Set(seed.measurement_unit),
            ..Default::default()
        })
        .exec(pool)
        .await?;
        created += 1;
    }

    log::info!(
        "Ingredient import from {}: {} created, {} already present",
        path,
        created,
        total - created
    );
    Ok(())
}

async fn import_tags(path: &str, pool: &DbPool) -> Result<(), anyhow::Error> {
    let data = std::fs::read_to_string(path)?;
    let seeds: Vec<TagSeed> = serde_json::from_str(&data)?;
    let total = seeds.len();

    let mut created = 0;
    for seed in seeds {
        let existing = tag::Entity::find()
            .filter(
                Condition::any()
                    .add(tag::Column::Name.eq(&seed.name))
                    .add(tag::Column::Slug.eq(&seed.slug)),
            )
            .one(pool)
            .await?;
        if existing.is_some() {
            continue;
        }
        tag::Entity::insert(tag::ActiveModel {
            name: sea_orm::Set(seed.name),
            slug: sea_orm::Set(seed.slug),
            ..Default::default()
        })
        .exec(pool)
        .await?;
        created += 1;
    }

    log::info!(
        "Tag import from {}: {} created, {} already present",
        path,
        created,
        total - created
    );
    Ok(())
}
