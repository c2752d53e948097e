#![allow(dead_code)]

use std::{net::SocketAddr, num::NonZeroUsize, sync::Arc, time::Duration};

use axum::Router;
use quote_ingestor::models::request_params::DailySeriesParams;
use quote_proxy::{
    config::{ServiceConfig, Timeouts},
    errors::ServiceError,
    server::{Phase, Server},
};
use secrecy::SecretString;
use tokio::{
    net::TcpListener,
    sync::{oneshot, watch},
    task::JoinHandle,
};

pub const IBM_DAILY_ADJUSTED: &[u8] =
    include_bytes!("../../../quote_ingestor/tests/fixtures/ibm_daily_adjusted.json");

/// `IBM_DAILY_ADJUSTED` trimmed to its 7 most recent days.
pub const WINDOWED_IBM: &str = r#"{"Meta Data":{"1. Information":"Daily Prices (open, high, low, close) and Volumes","2. Symbol":"IBM","3. Last Refreshed":"2023-06-08","4. Output Size":"Compact","5. Time Zone":"US/Eastern"},"Time Series (Daily)":{"2023-06-01":{"1. open":"128.44","2. high":"130.145","3. low":"127.78","4. close":"129.82","6. volume":"0"},"2023-06-02":{"1. open":"130.38","2. high":"133.12","3. low":"130.15","4. close":"132.42","6. volume":"0"},"2023-06-05":{"1. open":"133.12","2. high":"133.58","3. low":"132.27","4. close":"132.64","6. volume":"0"},"2023-06-06":{"1. open":"132.43","2. high":"132.94","3. low":"131.88","4. close":"132.69","6. volume":"0"},"2023-06-07":{"1. open":"132.5","2. high":"134.44","3. low":"132.19","4. close":"134.38","6. volume":"0"},"2023-06-08":{"1. open":"134.69","2. high":"135.98","3. low":"134.01","4. close":"134.41","6. volume":"0"},"2023-06-09":{"1. open":"134.6899","2. high":"135.9801","3. low":"134.0101","4. close":"134.4101","6. volume":"0"}},"ClosingAverage":"132.97"}"#;

/// Serves `router` on an ephemeral local port for the life of the test runtime.
pub async fn spawn_upstream(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock upstream");
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}

/// Short ceilings so timing tests finish quickly.
pub fn fast_timeouts() -> Timeouts {
    Timeouts {
        request: Duration::from_millis(500),
        read: Duration::from_secs(1),
        write: Duration::from_secs(2),
        idle: Duration::from_secs(5),
        drain: Duration::from_secs(2),
    }
}

pub fn test_config(upstream: SocketAddr, window: usize, timeouts: Timeouts) -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        api_base_url: format!("http://{upstream}"),
        api_key: SecretString::from("demo".to_string()),
        series: DailySeriesParams::new("IBM"),
        window: NonZeroUsize::new(window).expect("window"),
        timeouts,
    }
}

pub struct RunningServer {
    pub addr: SocketAddr,
    pub phase: watch::Receiver<Phase>,
    trigger: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), ServiceError>>,
}

impl RunningServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Fires the shutdown future without waiting for the drain.
    pub fn begin_shutdown(self) -> JoinHandle<Result<(), ServiceError>> {
        let _ = self.trigger.send(());
        self.handle
    }

    pub async fn stop(self) -> Result<(), ServiceError> {
        self.begin_shutdown().await.expect("server task")
    }
}

pub async fn launch(config: ServiceConfig) -> RunningServer {
    let provider = config.provider().expect("provider");
    let server = Server::bind(&config, Arc::new(provider)).await.expect("bind");
    let addr = server.local_addr();
    let phase = server.phase();

    let (trigger, fired) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.run_until(async move {
        let _ = fired.await;
    }));

    RunningServer {
        addr,
        phase,
        trigger,
        handle,
    }
}
