mod app;
mod auth;
mod config;
mod error;
mod recipes;
mod state;
mod tags;
mod users;

use state::AppState;
use users::repo::{User, UserFields};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipebox=debug,axum=info,tower_http=info".to_string());
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

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("create-superuser") {
        return create_superuser_command(&args[2..]).await;
    }

    let app_state = AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}

/// `recipebox create-superuser <email> <password>` — bootstrap an admin
/// account without going through the API.
async fn create_superuser_command(args: &[String]) -> anyhow::Result<()> {
    let (email, password) = match args {
        [email, password] => (email, password),
        _ => anyhow::bail!("usage: recipebox create-superuser <email> <password>"),
    };

    let app_state = AppState::init().await?;
    let user = User::create_superuser(&app_state.db, email, password, UserFields::default())
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    tracing::info!(user_id = %user.id, email = %user.email, "superuser created");
    Ok(())
}
