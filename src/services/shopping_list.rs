use chrono::NaiveDate;
use std::collections::HashMap;

/// One (cart recipe x ingredient) row, as loaded from recipe_ingredients
/// joined with the catalog.
#[derive(Debug, Clone)]
pub struct CartRow {
    pub recipe_name: String,
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedIngredient {
    pub ingredient_id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Single-pass group-by-sum over the cart rows.
///
/// Buckets are keyed by ingredient id, so catalog entries sharing a name under
/// different units stay separate. Output keeps first-encounter order; the
/// second value is the distinct contributing recipe names, also in
/// first-encounter order.
pub fn aggregate_cart(rows: &[CartRow]) -> (Vec<AggregatedIngredient>, Vec<String>) {
    let mut ingredients: Vec<AggregatedIngredient> = Vec::new();
    let mut index_by_id: HashMap<i64, usize> = HashMap::new();
    let mut recipe_names: Vec<String> = Vec::new();

    for row in rows {
        if !recipe_names.contains(&row.recipe_name) {
            recipe_names.push(row.recipe_name.clone());
        }
        match index_by_id.get(&row.ingredient_id) {
            Some(&i) => ingredients[i].total_amount += row.amount,
            None => {
                index_by_id.insert(row.ingredient_id, ingredients.len());
                ingredients.push(AggregatedIngredient {
                    ingredient_id: row.ingredient_id,
                    name: row.ingredient_name.clone(),
                    measurement_unit: row.measurement_unit.clone(),
                    total_amount: row.amount,
                });
            }
        }
    }

    (ingredients, recipe_names)
}

/// Renders the downloadable plain-text report.
pub fn render_shopping_list(
    ingredients: &[AggregatedIngredient],
    recipe_names: &[String],
    date: NaiveDate,
) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Shopping list ({})", date.format("%Y-%m-%d")));
    lines.push(String::new());
    for (index, ingredient) in ingredients.iter().enumerate() {
        lines.push(format!(
            "{}. {}: {} {}",
            index + 1,
            capitalize(&ingredient.name),
            ingredient.total_amount,
            ingredient.measurement_unit
        ));
    }
    lines.push(String::new());
    lines.push(format!("For recipes: {}", recipe_names.join(", ")));
    lines.join("\n")
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(recipe: &str, id: i64, name: &str, unit: &str, amount: i64) -> CartRow {
        CartRow {
            recipe_name: recipe.to_string(),
            ingredient_id: id,
            ingredient_name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn sums_across_recipes() {
        let rows = vec![
            row("RecipeA", 1, "salt", "g", 5),
            row("RecipeA", 2, "pepper", "g", 2),
            row("RecipeB", 1, "salt", "g", 3),
        ];
        let (ingredients, recipes) = aggregate_cart(&rows);

        assert_eq!(recipes, vec!["RecipeA".to_string(), "RecipeB".to_string()]);
        assert_eq!(ingredients.len(), 2);
        assert_eq!(ingredients[0].name, "salt");
        assert_eq!(ingredients[0].total_amount, 8);
        assert_eq!(ingredients[1].name, "pepper");
        assert_eq!(ingredients[1].total_amount, 2);
    }

    #[test]
    fn totals_independent_of_row_order() {
        let forward = vec![
            row("RecipeA", 1, "salt", "g", 5),
            row("RecipeA", 2, "pepper", "g", 2),
            row("RecipeB", 1, "salt", "g", 3),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let totals = |rows: &[CartRow]| {
            let (ingredients, _) = aggregate_cart(rows);
            let mut by_id: Vec<(i64, i64)> = ingredients
                .iter()
                .map(|i| (i.ingredient_id, i.total_amount))
                .collect();
            by_id.sort();
            by_id
        };

        assert_eq!(totals(&forward), totals(&reversed));
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        // Two catalog entries named "salt" under different units must not merge.
        let rows = vec![
            row("RecipeA", 1, "salt", "g", 5),
            row("RecipeB", 7, "salt", "tsp", 2),
        ];
        let (ingredients, _) = aggregate_cart(&rows);
        assert_eq!(ingredients.len(), 2);
        assert_eq!(ingredients[0].measurement_unit, "g");
        assert_eq!(ingredients[1].measurement_unit, "tsp");
    }

    #[test]
    fn empty_cart() {
        let (ingredients, recipes) = aggregate_cart(&[]);
        assert!(ingredients.is_empty());
        assert!(recipes.is_empty());
    }

    #[test]
    fn rendered_report_shape() {
        let rows = vec![
            row("Borscht", 1, "salt", "g", 5),
            row("Pelmeni", 1, "salt", "g", 3),
        ];
        let (ingredients, recipes) = aggregate_cart(&rows);
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let text = render_shopping_list(&ingredients, &recipes, date);

        assert!(text.starts_with("Shopping list (2025-03-14)"));
        assert!(text.contains("1. Salt: 8 g"));
        assert!(text.contains("For recipes: Borscht, Pelmeni"));
    }
}
