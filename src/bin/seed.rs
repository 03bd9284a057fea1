use catalog_manager::{AppState, config::AppConfig, repository::PostgresRepository, seed};
use sqlx::postgres::PgPoolOptions;
use std::{process::ExitCode, sync::Arc};

/// catalog-seed
///
/// Wipes the Postgres catalog named by `DATABASE_URL` and fills it with the
/// demo categories and items.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_manager=info".into()),
        )
        .init();

    let config = AppConfig::load();
    let Some(db_url) = config.db_url.clone() else {
        tracing::error!("DATABASE_URL must be set to seed the catalog");
        return ExitCode::FAILURE;
    };

    let pool = match PgPoolOptions::new().max_connections(2).connect(&db_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to connect to Postgres: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("Failed to run migrations: {}", e);
        return ExitCode::FAILURE;
    }

    let repo = Arc::new(PostgresRepository::new(pool));
    if let Err(e) = repo.clear().await {
        tracing::error!("Failed to clear the catalog: {}", e);
        return ExitCode::FAILURE;
    }
    tracing::info!("Cleared categories and items");

    let password = config.admin_password.clone();
    let state = AppState::new(repo, config);
    match seed::populate(&state.categories, &state.items, &password).await {
        Ok(summary) => {
            tracing::info!(
                "Seeded {} categories and {} items",
                summary.categories,
                summary.items
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
