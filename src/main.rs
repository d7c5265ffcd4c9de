#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else)]

use crate::{
    config::RuntimeConfiguration,
    data::student::seed_sample_students,
    routes::{
        api::{get_health, get_student, get_students, not_found, post_register},
        index::get_index_route,
        register::{get_register_page, post_register_form},
    },
    state::MantraState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[macro_use]
extern crate tracing;

mod config;
mod data;
mod error;
mod maud_conveniences;
mod routes;
mod state;
#[cfg(test)]
mod test_utils;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("signal received, starting graceful shutdown");
}

pub fn router(state: MantraState) -> Router {
    let upload_config = state.config().upload_config();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(get_index_route))
        .route("/register", get(get_register_page).post(post_register_form))
        .route("/api/register", post(post_register))
        .route("/api/students", get(get_students))
        .route("/api/students/{id}", get(get_student))
        .route("/api/health", get(get_health))
        .nest_service("/uploads", ServeDir::new(upload_config.directory()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(upload_config.max_body_bytes()))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

///serves until `signal` resolves and every in-flight request has drained, and only then closes the pool
async fn serve_until(
    listener: TcpListener,
    state: MantraState,
    signal: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(signal)
        .await?;

    if let Err(e) = state.sensible_shutdown().await {
        error!(?e, "Error sensibly shutting down");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    )
    .expect("unable to set tracing subscriber");

    info!("`tracing` online");

    if let Err(e) = dotenvy::dotenv() {
        info!(?e, "No .env file loaded, using the process environment");
    }

    let options = SqlitePoolOptions::new().max_connections(5);
    let config = RuntimeConfiguration::new().expect("unable to create config");
    let state = MantraState::new(options, config.clone())
        .await
        .expect("unable to create state");

    if config.seed_sample_data() {
        seed_sample_students(&state)
            .await
            .expect("unable to seed sample data");
    }

    let server_ip = config.server_ip();
    let listener = TcpListener::bind(server_ip)
        .await
        .expect("unable to listen on server ip");

    info!(?server_ip, "Listening");
    serve_until(listener, state, shutdown_signal())
        .await
        .expect("unable to serve app");
}

#[cfg(test)]
mod tests {
    use super::serve_until;
    use crate::test_utils::test_state;
    use tokio::{net::TcpListener, sync::oneshot};

    #[tokio::test]
    async fn pool_closes_only_after_the_server_stops() {
        let (_dir, state) = test_state().await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (stop, stopped) = oneshot::channel::<()>();

        let watched = state.clone();
        let server = tokio::spawn(serve_until(listener, state.clone(), async move {
            let _ = stopped.await;
            assert!(!watched.is_closed(), "pool was closed while still serving");
        }));

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
        assert!(state.is_closed());
    }
}
