//! Restaurant list filtering helpers (cuisine + neighborhood).

use crate::models::Restaurant;

/// Filter value meaning "no filter".
pub const ALL: &str = "all";

/// Keep restaurants matching both filters exactly. `None`, blank, or `"all"`
/// disables a filter.
#[must_use]
pub fn filter_restaurants(
    restaurants: Vec<Restaurant>,
    cuisine: Option<&str>,
    neighborhood: Option<&str>,
) -> Vec<Restaurant> {
    let cuisine = active_filter(cuisine);
    let neighborhood = active_filter(neighborhood);

    restaurants
        .into_iter()
        .filter(|r| cuisine.is_none_or(|cuisine| r.cuisine_type == cuisine))
        .filter(|r| neighborhood.is_none_or(|neighborhood| r.neighborhood == neighborhood))
        .collect()
}

/// Unique neighborhoods in first-seen order.
#[must_use]
pub fn neighborhoods(restaurants: &[Restaurant]) -> Vec<String> {
    unique(restaurants.iter().map(|r| r.neighborhood.as_str()))
}

/// Unique cuisines in first-seen order.
#[must_use]
pub fn cuisines(restaurants: &[Restaurant]) -> Vec<String> {
    unique(restaurants.iter().map(|r| r.cuisine_type.as_str()))
}

fn active_filter(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != ALL)
}

fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !value.is_empty() && !seen.iter().any(|existing| existing == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn restaurant(id: i64, cuisine: &str, neighborhood: &str) -> Restaurant {
        let mut restaurant = Restaurant::new(id, format!("Restaurant {id}"));
        restaurant.cuisine_type = cuisine.to_string();
        restaurant.neighborhood = neighborhood.to_string();
        restaurant
    }

    fn sample() -> Vec<Restaurant> {
        vec![
            restaurant(1, "Asian", "Manhattan"),
            restaurant(2, "Pizza", "Brooklyn"),
            restaurant(3, "Asian", "Queens"),
            restaurant(4, "Pizza", "Manhattan"),
        ]
    }

    fn ids(restaurants: &[Restaurant]) -> Vec<i64> {
        restaurants.iter().map(|r| r.id).collect()
    }

    #[test]
    fn all_or_none_disables_filter() {
        assert_eq!(ids(&filter_restaurants(sample(), None, None)), vec![1, 2, 3, 4]);
        assert_eq!(
            ids(&filter_restaurants(sample(), Some("all"), Some(" "))),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn filters_combine() {
        assert_eq!(
            ids(&filter_restaurants(sample(), Some("Pizza"), None)),
            vec![2, 4]
        );
        assert_eq!(
            ids(&filter_restaurants(sample(), Some("Asian"), Some("Queens"))),
            vec![3]
        );
        assert!(filter_restaurants(sample(), Some("Greek"), Some("all")).is_empty());
    }

    #[test]
    fn unique_values_keep_first_seen_order() {
        assert_eq!(
            neighborhoods(&sample()),
            vec!["Manhattan".to_string(), "Brooklyn".into(), "Queens".into()]
        );
        assert_eq!(cuisines(&sample()), vec!["Asian".to_string(), "Pizza".into()]);
    }
}
