use restaviews_core::catalog;
use serde::Serialize;

use super::common::{format_restaurant_line, parse_id, print_json, Context};
use crate::error::CliError;

#[derive(Serialize)]
struct FilterOptions {
    cuisines: Vec<String>,
    neighborhoods: Vec<String>,
}

pub async fn run_list(
    ctx: &Context,
    cuisine: Option<&str>,
    neighborhood: Option<&str>,
) -> Result<(), CliError> {
    let engine = ctx.engine().await?;
    let restaurants = engine
        .restaurants_by_cuisine_and_neighborhood(cuisine, neighborhood)
        .await?;

    if ctx.json {
        return print_json(&restaurants);
    }
    if restaurants.is_empty() {
        println!("No restaurants found.");
        return Ok(());
    }
    for restaurant in &restaurants {
        println!("{}", format_restaurant_line(restaurant));
    }
    Ok(())
}

pub async fn run_show(ctx: &Context, raw_id: &str) -> Result<(), CliError> {
    let id = parse_id(raw_id)?;
    let engine = ctx.engine().await?;
    let restaurant = engine.fetch_restaurant(id).await?;

    if ctx.json {
        return print_json(&restaurant);
    }
    println!("{}", format_restaurant_line(&restaurant));
    if !restaurant.address.is_empty() {
        println!("      {}", restaurant.address);
    }
    for (day, hours) in &restaurant.operating_hours {
        println!("      {day:<10} {hours}");
    }
    Ok(())
}

pub async fn run_filters(ctx: &Context) -> Result<(), CliError> {
    let engine = ctx.engine().await?;
    let restaurants = engine.fetch_restaurants().await?;
    let options = FilterOptions {
        cuisines: catalog::cuisines(&restaurants),
        neighborhoods: catalog::neighborhoods(&restaurants),
    };

    if ctx.json {
        return print_json(&options);
    }
    println!("Cuisines: {}", options.cuisines.join(", "));
    println!("Neighborhoods: {}", options.neighborhoods.join(", "));
    Ok(())
}
