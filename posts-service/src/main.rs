use anyhow::Context;
use posts_service::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config)?;

    let server = Server::new(config.clone());
    let result = match config.database.clone() {
        Some(db) => {
            let pool = create_pool(&db).await?;
            if db.run_migrations {
                bootstrap_schema(&pool).await?;
            }
            let state =
                AppState::new(config, PgPostDelegate::new(pool.clone())).with_db_pool(pool);
            server.serve(build_router(state)).await
        }
        None => {
            warn!("No database configured; posts are kept in memory and lost on exit");
            let state = AppState::new(config, MemoryPostDelegate::new());
            server.serve(build_router(state)).await
        }
    };

    shutdown_tracing();
    result.context("server terminated with an error")
}
