//! Area listing and details.

use anyhow::Result;
use entsoe_lib::prelude::*;

/// List known areas, optionally filtered by a search pattern.
pub(crate) fn list_areas(search: Option<&str>) -> Result<()> {
    let registry = AreaRegistry::global();

    let areas: Vec<_> = match search {
        Some(pattern) => registry.search(pattern),
        None => registry.all().collect(),
    };

    if areas.is_empty() {
        println!("No areas found.");
        return Ok(());
    }

    println!("{:<16} {:<18} {:<20} {}", "KEY", "CODE", "TIMEZONE", "MEANING");
    println!("{}", "-".repeat(90));

    for area in &areas {
        println!(
            "{:<16} {:<18} {:<20} {}",
            area.key(),
            area.code(),
            area.tz().name(),
            area.meaning()
        );
    }

    println!("\nTotal: {} areas", areas.len());
    Ok(())
}

/// Show one area and its neighbours.
pub(crate) fn show_area(key: &str) -> Result<()> {
    let registry = AreaRegistry::global();
    let area = registry.lookup(key)?;

    println!("Area:     {}", area.key());
    println!("Code:     {}", area.code());
    println!("Meaning:  {}", area.meaning());
    println!("Timezone: {}", area.tz().name());

    let neighbours = registry.neighbours(area);
    if neighbours.is_empty() {
        println!("\nNo neighbours on record.");
    } else {
        let keys: Vec<_> = neighbours.iter().map(|n| n.key()).collect();
        println!("\nNeighbours: {}", keys.join(", "));
    }

    Ok(())
}
