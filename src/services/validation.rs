use crate::error::ApiError;
use crate::models::RecipeIngredientInput;
use std::collections::HashSet;

/// Validates a recipe write payload before anything is persisted.
///
/// Checks run in a fixed order so error reporting is deterministic:
/// 1. ingredients list non-empty
/// 2. tags list non-empty
/// 3. image present and non-empty
/// 4. cooking_time >= 1
/// 5. every ingredient id exists in the catalog (first unknown id is named)
/// 6. every ingredient amount >= 1
/// 7. no duplicate ingredient ids (duplicates are named)
/// 8. no duplicate tag ids (duplicates are named)
pub fn validate_recipe_write(
    ingredients: &[RecipeIngredientInput],
    tags: &[i64],
    image: Option<&str>,
    cooking_time: i32,
    known_ingredient_ids: &HashSet<i64>,
) -> Result<(), ApiError> {
    if ingredients.is_empty() {
        return Err(ApiError::Validation(
            "Field ingredients must not be empty".to_string(),
        ));
    }
    if tags.is_empty() {
        return Err(ApiError::Validation(
            "Field tags must not be empty".to_string(),
        ));
    }
    match image {
        Some(image) if !image.is_empty() => {}
        _ => {
            return Err(ApiError::Validation(
                "Field image must not be empty".to_string(),
            ));
        }
    }
    if cooking_time < 1 {
        return Err(ApiError::Validation(format!(
            "Cooking time must be at least 1 minute, got {}",
            cooking_time
        )));
    }
    for ingredient in ingredients {
        if !known_ingredient_ids.contains(&ingredient.id) {
            return Err(ApiError::Validation(format!(
                "Ingredient {} does not exist",
                ingredient.id
            )));
        }
    }
    for ingredient in ingredients {
        if ingredient.amount < 1 {
            return Err(ApiError::Validation(format!(
                "Amount for ingredient {} must be at least 1, got {}",
                ingredient.id, ingredient.amount
            )));
        }
    }
    let ingredient_ids: Vec<i64> = ingredients.iter().map(|i| i.id).collect();
    if let Some(duplicates) = duplicate_ids(&ingredient_ids) {
        return Err(ApiError::Validation(format!(
            "Ingredients must not repeat: {:?}",
            duplicates
        )));
    }
    if let Some(duplicates) = duplicate_ids(tags) {
        return Err(ApiError::Validation(format!(
            "Tags must not repeat: {:?}",
            duplicates
        )));
    }
    Ok(())
}

/// Ids occurring more than once, in first-occurrence order; None if all unique.
fn duplicate_ids(ids: &[i64]) -> Option<Vec<i64>> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for id in ids {
        if !seen.insert(*id) && !duplicates.contains(id) {
            duplicates.push(*id);
        }
    }
    if duplicates.is_empty() {
        None
    } else {
        Some(duplicates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> HashSet<i64> {
        [1, 2, 3].into_iter().collect()
    }

    fn input(id: i64, amount: i32) -> RecipeIngredientInput {
        RecipeIngredientInput { id, amount }
    }

    #[test]
    fn valid_payload_passes() {
        let ingredients = vec![input(1, 5), input(2, 1)];
        assert!(validate_recipe_write(
            &ingredients,
            &[10, 20],
            Some("data:image/png;base64,xyz"),
            30,
            &catalog()
        )
        .is_ok());
    }

    #[test]
    fn empty_ingredients_rejected_first() {
        // Even with other fields broken, the ingredients check reports first.
        let err = validate_recipe_write(&[], &[], None, 0, &catalog()).unwrap_err();
        assert!(err.to_string().contains("ingredients"));
    }

    #[test]
    fn empty_tags_rejected() {
        let ingredients = vec![input(1, 5)];
        let err =
            validate_recipe_write(&ingredients, &[], Some("img"), 30, &catalog()).unwrap_err();
        assert!(err.to_string().contains("tags"));
    }

    #[test]
    fn missing_image_rejected() {
        let ingredients = vec![input(1, 5)];
        let err = validate_recipe_write(&ingredients, &[10], None, 30, &catalog()).unwrap_err();
        assert!(err.to_string().contains("image"));

        let err = validate_recipe_write(&ingredients, &[10], Some(""), 30, &catalog()).unwrap_err();
        assert!(err.to_string().contains("image"));
    }

    #[test]
    fn cooking_time_boundary() {
        let ingredients = vec![input(1, 5)];
        assert!(
            validate_recipe_write(&ingredients, &[10], Some("img"), 1, &catalog()).is_ok()
        );
        let err =
            validate_recipe_write(&ingredients, &[10], Some("img"), 0, &catalog()).unwrap_err();
        assert!(err.to_string().contains("Cooking time"));
    }

    #[test]
    fn unknown_ingredient_named() {
        let ingredients = vec![input(1, 5), input(99, 2)];
        let err =
            validate_recipe_write(&ingredients, &[10], Some("img"), 30, &catalog()).unwrap_err();
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn zero_amount_rejected() {
        let ingredients = vec![input(1, 0)];
        let err =
            validate_recipe_write(&ingredients, &[10], Some("img"), 30, &catalog()).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn duplicate_ingredients_named() {
        let ingredients = vec![input(1, 5), input(2, 2), input(1, 3)];
        let err =
            validate_recipe_write(&ingredients, &[10], Some("img"), 30, &catalog()).unwrap_err();
        assert!(err.to_string().contains("Ingredients must not repeat"));
        assert!(err.to_string().contains('1'));
    }

    #[test]
    fn duplicate_tags_named() {
        let ingredients = vec![input(1, 5)];
        let err = validate_recipe_write(&ingredients, &[10, 10], Some("img"), 30, &catalog())
            .unwrap_err();
        assert!(err.to_string().contains("Tags must not repeat"));
    }
}
