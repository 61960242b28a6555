//! Maintenance binary: connect to the configured database, verify it is
//! reachable, and apply pending migrations.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    let pool = intake_db::create_pool(&database_url).await?;
    intake_db::health_check(&pool).await?;
    tracing::info!("database health check passed");

    intake_db::run_migrations(&pool).await?;
    tracing::info!("migrations applied");

    Ok(())
}
