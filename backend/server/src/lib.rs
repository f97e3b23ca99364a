//! Backend of the car inventory dashboard.
//!
//! Thin HTTP layer over a MongoDB database: list vehicle models and part
//! references, adjust their stock, and check administrator logins.
//!
//!
//!
//! # Routes
//!
//! | Method | Path | Body | Answers |
//! |---|---|---|---|
//! | GET | `/cars` | | 200 list, 500 |
//! | PUT | `/cars/{model}/{type}` | `{ "stock": any }` | 200, 404, 500 |
//! | GET | `/refs` | | 200 list, 500 |
//! | PUT | `/refs/{id}` | `{ "stock": number >= 0 }` | 200, 400, 404, 500 |
//! | POST | `/login` | `{ "email", "pass" }` | 200, 401, 500 |
//! | GET | `/`, `/test` | | 200 plain text |
//!
//! Client errors answer `{ "message": .. }`, everything else `{ "error": .. }`.
//!
//!
//!
//! # Notes
//!
//! ## Updates
//! Success means the database reports exactly one modified document. Writing the
//! value a field already holds modifies nothing, so it answers 404 like a missing
//! document does.
//!
//! ## Admin accounts
//! Accounts are inserted by hand and hold the password in plain text. The server
//! compares in constant time but never hashes. No token is issued on login.
//!
//! ## Startup
//! The listener is only bound once the database answers a ping. A bad
//! configuration or an unreachable database exits with an error instead.
//!
//!
//!
//! # Setup
//!
//! Run against a local MongoDB.
//! ```sh
//! DB_HOST=localhost:27017 RUST_LOG=info cargo run -p inventory
//! ```
//!
//! Run against Atlas, with the password mounted as a secret or exported.
//! ```sh
//! DB_SCHEME=mongodb+srv DB_HOST=cluster.mongodb.net DB_USER=stock DB_PASS=... \
//!     cargo run -p inventory
//! ```
//!
//! A `.env` file in the working directory is read at startup. Variables already
//! exported win over its entries.
//! ```sh
//! printf 'DB_HOST=localhost:27017\nRUST_LOG=debug\n' > .env
//! cargo run -p inventory
//! ```
//!
//! Log every update result.
//! ```sh
//! cargo run -p inventory --features verbose
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post, put},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod memory;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use database::MongoStore;
use error::StartupError;
use routes::{
    list_cars_handler, list_refs_handler, login_handler, test_handler, update_car_stock_handler,
    update_ref_stock_handler, welcome_handler,
};
use state::AppState;

pub async fn start_server() -> Result<(), StartupError> {
    // Read before the subscriber so RUST_LOG can come from the file too
    let env_file = dotenvy::dotenv();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match env_file {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {e}"),
    }

    info!("Loading config...");
    let config = Config::load()?;

    info!("Connecting to MongoDB...");
    let store = MongoStore::connect(&config).await?;

    let address = format!("0.0.0.0:{}", config.port);
    let app = router(AppState::new(Arc::new(store)));

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    info!("Server shut down");

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(welcome_handler))
        .route("/test", get(test_handler))
        .route("/cars", get(list_cars_handler))
        .route("/cars/{model}/{type}", put(update_car_stock_handler))
        .route("/refs", get(list_refs_handler))
        .route("/refs/{id}", put(update_ref_stock_handler))
        .route("/login", post(login_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
