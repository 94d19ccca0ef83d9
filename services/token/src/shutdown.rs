//! Signal handling and graceful HTTP shutdown.

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::IssuerError;

/// Wait for SIGTERM or Ctrl+C.
///
/// If a handler cannot be installed that source is ignored and the other one
/// still triggers shutdown.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, initiating shutdown"),
        () = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
}

/// Serve `app` until `shutdown` resolves, then give in-flight requests up to
/// `grace` to finish before aborting them.
///
/// # Errors
///
/// Returns an error if the server fails while running.
pub async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> Result<(), IssuerError>
where
    F: std::future::Future<Output = ()> + Send,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => return flatten(result),
        () = shutdown => {}
    }

    let _ = stop_tx.send(true);

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            info!("Server drained");
            flatten(result)
        }
        Err(_) => {
            warn!(grace_secs = grace.as_secs(), "Shutdown timeout reached, aborting connections");
            server.abort();
            Ok(())
        }
    }
}

fn flatten(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), IssuerError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(IssuerError::server(format!("listener failed: {e}"))),
        Err(e) => Err(IssuerError::server(format!("server task failed: {e}"))),
    }
}
