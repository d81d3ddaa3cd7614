//! Print slot and day totals for a diet template
//! Usage: cargo run --bin diet_report -- <diet_template_id>

use coachplan::config::AppConfig;
use coachplan::db::{migrations, Database};
use coachplan::models::Macros;
use coachplan::tools::diets::get_diet_edit_view;
use coachplan::tools::CoachContext;

fn print_totals(label: &str, totals: &Macros) {
    println!(
        "  {:<24} {:>8.1} kcal  P {:>6.1} g  C {:>6.1} g  F {:>6.1} g",
        label, totals.kcal, totals.protein, totals.carbs, totals.fat
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let diet_id: i64 = match args.get(1) {
        Some(arg) => arg.parse()?,
        None => {
            eprintln!("Usage: diet_report <diet_template_id>");
            std::process::exit(2);
        }
    };

    let config = AppConfig::from_env()?;
    println!("Database: {}", config.database_path.display());

    let database = Database::new(&config.database_path)?;
    database.with_conn(migrations::run_migrations)?;

    let context = CoachContext::new(database, config.coach_id, config.nutrient_codes);
    let view = get_diet_edit_view(&context, diet_id)?;

    println!("Diet {} - {} ({} slots)", view.diet.id, view.diet.name, view.slots.len());
    for slot in &view.slots {
        let label = format!("{}. {} x{}", slot.slot.position, slot.slot.label, slot.slot.multiplier);
        print_totals(&label, &slot.totals);
        for item in &slot.items {
            println!(
                "      {:>7.1} g  {}",
                item.quantity_g,
                item.food_name.as_deref().unwrap_or("(unknown food)")
            );
        }
    }
    println!();
    print_totals("Day", &view.day_totals);

    Ok(())
}
