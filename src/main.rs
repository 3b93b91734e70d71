use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use licensing::config::Config;
use licensing::db::{AppState, create_pool, init_db, queries};
use licensing::error::Result;
use licensing::handlers;
use licensing::jwt::TokenKeys;
use licensing::models::{CreateLicenseType, CreateProduct, CreateUser, ROLE_ADMIN, ROLE_USER};

#[derive(Parser, Debug)]
#[command(name = "licensing")]
#[command(about = "Device-bound software license server")]
struct Cli {
    /// Seed the database with dev data (admin user, product, license type)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, err);
    std::process::exit(1);
}

fn seed_dev_data(state: &AppState) -> Result<()> {
    let conn = state.db.get()?;

    if queries::count_users(&conn)? > 0 {
        tracing::info!("Database already has data, skipping seed");
        return Ok(());
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let admin_roles = vec![ROLE_ADMIN.to_string(), ROLE_USER.to_string()];
    let admin = queries::create_user(
        &conn,
        &CreateUser {
            email: "admin@licensing.local".to_string(),
            name: "Dev Admin".to_string(),
            roles: admin_roles.clone(),
        },
    )?;
    let customer = queries::create_user(
        &conn,
        &CreateUser {
            email: "customer@licensing.local".to_string(),
            name: "Dev Customer".to_string(),
            roles: vec![ROLE_USER.to_string()],
        },
    )?;
    let product = queries::create_product(
        &conn,
        &CreateProduct {
            name: "Dev Product".to_string(),
            blocked: false,
        },
    )?;
    let license_type = queries::create_license_type(
        &conn,
        &CreateLicenseType {
            name: "Monthly".to_string(),
            default_duration: 30,
            description: Some("30-day license".to_string()),
        },
    )?;

    let admin_token = state.tokens.issue(&admin.email, &admin_roles)?;
    let customer_token = state.tokens.issue(&customer.email, &customer.roles)?;

    tracing::info!("Admin:        {} ({})", admin.email, admin.id);
    tracing::info!("Customer:     {} ({})", customer.email, customer.id);
    tracing::info!("Product:      {}", product.id);
    tracing::info!("License type: {}", license_type.id);
    tracing::info!("Admin token:    {}", admin_token);
    tracing::info!("Customer token: {}", customer_token);
    tracing::info!("============================================");

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "licensing=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().unwrap_or_else(|e| fail("Invalid configuration", e));

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path, config.db_pool_size)
        .unwrap_or_else(|e| fail("Failed to create database pool", e));

    {
        let conn = db_pool
            .get()
            .unwrap_or_else(|e| fail("Failed to get connection", e));
        init_db(&conn).unwrap_or_else(|e| fail("Failed to initialize database", e));
    }

    let tokens = TokenKeys::new(config.jwt_secret.as_bytes(), config.jwt_ttl_hours);
    let state = AppState::new(db_pool, tokens);

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set LICENSING_ENV=dev)");
        } else if let Err(e) = seed_dev_data(&state) {
            fail("Failed to seed dev data", e);
        }
    }

    let app = Router::new()
        .merge(handlers::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| fail("Failed to bind to address", e));

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Licensing server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    if cleanup_on_exit {
        let db_path = &config.database_path;
        match std::fs::remove_file(db_path) {
            Ok(()) => tracing::info!("Removed {}", db_path),
            Err(e) => tracing::warn!("Failed to remove {}: {}", db_path, e),
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
