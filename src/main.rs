mod analytics;
mod app;
mod auth;
mod config;
mod db;
mod dto;
mod error;
mod ingredients;
mod inventory;
mod meals;
mod notify;
mod reports;
mod servings;
mod settings;
mod state;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "mealstock=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;
    db::migrate(&app_state.db).await;
    users::services::ensure_bootstrap_admin(
        &app_state.db,
        app_state.config.bootstrap_admin.as_ref(),
    )
    .await?;

    app::serve(app::build_app(app_state)).await
}
