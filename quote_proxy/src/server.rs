//! Listener, routes and graceful shutdown.
//!
//! Connections are served by hyper's HTTP/1.1 implementation with the axum
//! router as the service. [`Server::run_until`] stops accepting once its
//! shutdown future resolves, asks every live connection to finish its
//! in-flight request and close, and waits at most [`Timeouts::drain`] for them.

use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, extract::State, http::Uri, response::Response, routing::get};
use quote_ingestor::providers::QuoteProvider;
use tokio::{net::TcpListener, sync::watch};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    config::{ServiceConfig, Timeouts},
    connection::serve_connection,
    errors::ServiceError,
    orchestrator::QuoteProxy,
};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Where the server is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Draining,
    Stopped,
}

/// Routes for the service: `/` proxies the quote series, `/healthz` never
/// touches the upstream.
pub fn router(proxy: QuoteProxy, timeouts: &Timeouts) -> Router {
    Router::new()
        .route("/", get(quote))
        .route("/healthz", get(healthz))
        .layer(TimeoutLayer::new(timeouts.write))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(proxy))
}

async fn quote(State(proxy): State<Arc<QuoteProxy>>, uri: Uri) -> Response {
    proxy.respond(&uri).await
}

async fn healthz() -> &'static str {
    "ok"
}

pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
    timeouts: Timeouts,
    phase: watch::Sender<Phase>,
}

impl Server {
    /// Binds the listener. Nothing is served until [`Server::run_until`].
    pub async fn bind(
        config: &ServiceConfig,
        provider: Arc<dyn QuoteProvider>,
    ) -> Result<Self, ServiceError> {
        config.timeouts.validate()?;

        let addr = config.bind_addr();
        let listen_error = |source| ServiceError::Listen {
            addr: addr.clone(),
            source,
        };
        let listener = TcpListener::bind(&addr).await.map_err(listen_error)?;
        let local_addr = listener.local_addr().map_err(listen_error)?;

        let proxy = QuoteProxy::new(provider, config.window, config.timeouts.request);
        let (phase, _) = watch::channel(Phase::Running);

        Ok(Self {
            listener,
            local_addr,
            router: router(proxy, &config.timeouts),
            timeouts: config.timeouts,
            phase,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Subscribes to phase changes.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Serves until `shutdown` resolves, then drains.
    ///
    /// Returns once every connection has closed, or fails with
    /// [`ServiceError::Drain`] when the drain period runs out first.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServiceError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Server {
            listener,
            local_addr,
            router,
            timeouts,
            phase,
        } = self;

        let token = CancellationToken::new();
        tokio::spawn({
            let token = token.clone();
            async move {
                shutdown.await;
                token.cancel();
            }
        });

        let tracker = TaskTracker::new();
        info!(%local_addr, "Server is ready to handle requests");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracker.spawn(serve_connection(
                            stream,
                            peer,
                            router.clone(),
                            timeouts,
                            token.clone(),
                        ));
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }

        drop(listener);
        phase.send_replace(Phase::Draining);
        info!(
            connections = tracker.len(),
            drain = ?timeouts.drain,
            "Server is shutting down..."
        );

        tracker.close();
        if tokio::time::timeout(timeouts.drain, tracker.wait()).await.is_err() {
            error!(
                connections = tracker.len(),
                "Could not gracefully shutdown the server"
            );
            return Err(ServiceError::Drain {
                period: timeouts.drain,
            });
        }

        phase.send_replace(Phase::Stopped);
        info!("Server stopped");
        Ok(())
    }
}

/// Builds the provider from `config`, binds and serves until SIGINT/SIGTERM.
pub async fn start(config: ServiceConfig) -> Result<(), ServiceError> {
    let provider = config.provider()?;
    info!(
        upstream = %provider.endpoint(),
        window = config.window.get(),
        "starting quote proxy"
    );

    let server = Server::bind(&config, Arc::new(provider)).await?;
    server.run_until(shutdown_signal()).await
}

/// Resolves on the first Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
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
    info!("shutdown signal received");
}
