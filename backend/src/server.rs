use std::time::Duration;

use aide::openapi::{Info, OpenApi};
use axum::{Extension, Router};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{routes, state::AppServices, types::Environment};

/// Builds the application router with every service attached
#[must_use]
pub fn router(environment: Environment, services: &AppServices) -> Router {
    let mut openapi = OpenApi {
        info: Info {
            title: "Approved Cars".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Info::default()
        },
        ..OpenApi::default()
    };

    routes::handler()
        .finish_api(&mut openapi)
        .layer(Extension(openapi))
        .layer(Extension(environment))
        .layer(Extension(services.gallery.clone()))
        .layer(Extension(services.credentials.clone()))
        .layer(TraceLayer::new_for_http())
        // Page loads may create tables and download the demo image
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}

/// Provisions resources before the server accepts requests
///
/// Failures are logged only; page loads provision again.
pub async fn prepare_resources(environment: &Environment, services: &AppServices) {
    let provisioned = if environment.reset_on_start() {
        services.provisioner.reset().await
    } else {
        services.provisioner.ensure_all().await
    };
    if let Err(err) = provisioned {
        tracing::error!("Failed to provision resources: {err}");
        return;
    }

    if let Some((username, password)) = environment.seed_login() {
        if let Err(err) = services.provisioner.seed_login(&username, &password).await {
            tracing::error!("Failed to seed login: {err}");
        }
    }

    if let Err(err) = services.provisioner.seed_demo_image().await {
        tracing::warn!("Failed to seed demo image: {err}");
    }
}

/// Starts the server with the given environment and services
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(environment: Environment, services: AppServices) -> anyhow::Result<()> {
    let router = router(environment, &services);

    let addr = std::net::SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(8001), |p| p.parse())?,
    ));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚗 Approved Cars started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!("Failed to listen for SIGTERM: {err}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutting down");
}
