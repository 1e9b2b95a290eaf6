use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use quiz_core::{LeaderboardView, QuestionCatalog, ScoreKeeper};
use quiz_persistence::{QuestionRepository, ScoreRepository, connect_and_migrate};
use quiz_server::{
    auth::AuthService, config::Config, create_routes, session_manager::SessionManager,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Quiz Arena server...");

    let config = Arc::new(Config::new());

    // Initialize database connection and run migrations
    let db = match connect_and_migrate(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    let catalog = QuestionCatalog::new(Arc::new(QuestionRepository::new(db.clone())));
    let score_repository = Arc::new(ScoreRepository::new(db));
    let score_keeper = ScoreKeeper::new(score_repository.clone());
    let leaderboard = LeaderboardView::new(score_repository);

    // An empty bank is not fatal, admins can add questions later
    match catalog.load_bank(config.seed_default_questions).await {
        Ok(bank) => info!("Question bank holds {} playable questions", bank.len()),
        Err(e) => tracing::warn!("Question bank not ready: {}", e),
    }

    let session_manager = Arc::new(SessionManager::new(
        config.game.clone(),
        catalog.clone(),
        score_keeper.clone(),
        config.seed_default_questions,
    ));

    if config.admin_user_ids.is_empty() {
        tracing::warn!("ADMIN_USER_IDS is empty; question management is disabled");
    }

    // Check for dev mode
    let auth_service = if config.auth_dev_mode {
        info!("Starting in development authentication mode - token signatures not checked");
        Arc::new(AuthService::new_dev_mode(config.admin_user_ids.clone()))
    } else {
        match &config.jwt_secret {
            Some(secret) => Arc::new(AuthService::new(secret, config.admin_user_ids.clone())),
            None => {
                tracing::error!("AUTH_JWT_SECRET is required unless AUTH_DEV_MODE=true");
                std::process::exit(1);
            }
        }
    };

    let routes = create_routes(
        session_manager.clone(),
        catalog,
        score_keeper,
        leaderboard,
        auth_service,
        config.clone(),
    );

    // Start cleanup task
    let cleanup_session_manager = session_manager.clone();
    let idle_timeout = Duration::from_secs(config.session_idle_timeout_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            cleanup_session_manager.cleanup_idle_sessions(idle_timeout);
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let host = match config.host.parse::<IpAddr>() {
        Ok(host) => host,
        Err(e) => {
            tracing::error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown((host, config.port), shutdown_signal());

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;

    // Let actors flush finished rounds before the runtime goes away
    session_manager.shutdown().await;
    info!("Server shutdown complete.");
}

async fn shutdown_signal() {
    // Wait for SIGINT (Ctrl+C) or SIGTERM
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
        ) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {
                        info!("Received SIGINT, shutting down gracefully...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down gracefully...");
                    }
                }
                return;
            }
            _ => tracing::warn!("Failed to install signal handlers, falling back to Ctrl+C"),
        }
    }

    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down gracefully...");
}
