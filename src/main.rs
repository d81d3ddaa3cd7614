//! CoachPlan
//!
//! An MCP server for coach nutrition planning.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use coachplan::build_info;
use coachplan::config::AppConfig;
use coachplan::db::{self, Database};
use coachplan::mcp::CoachPlanService;
use coachplan::tools::CoachContext;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stderr only: stdout carries the MCP stream
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("coachplan=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = AppConfig::from_env()?;
    eprintln!("Database path: {}", config.database_path.display());
    eprintln!("Coach id: {}", config.coach_id);

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    eprintln!("Initializing database...");
    let database = Database::new(&config.database_path)?;

    let schema_version = database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        db::migrations::get_schema_version(conn)
    })?;
    eprintln!("Database schema version: {}", schema_version);

    let context = CoachContext::new(database, config.coach_id, config.nutrient_codes);
    let service = CoachPlanService::new(config.database_path, schema_version, context);

    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
