//! Per-request orchestration: one upstream call raced against a deadline.
//!
//! Each request to `/` spawns a task that fetches, windows and encodes the
//! series, then reports a [`RequestOutcome`] over a oneshot channel. The
//! handler waits on that channel until the request deadline. Whichever
//! happens first decides the only response written:
//!
//! | first event                         | status |
//! |-------------------------------------|--------|
//! | task reports a body                 | 200    |
//! | task reports an error (or panics)   | 502    |
//! | deadline passes                     | 504    |
//!
//! A task that loses the race keeps running until the provider notices the
//! same deadline; its late send fails quietly and the result is dropped.

use std::{num::NonZeroUsize, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use axum::{
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use quote_ingestor::providers::QuoteProvider;
use tokio::{
    sync::oneshot,
    time::{Instant, timeout_at},
};
use tracing::{debug, error, info, warn};

use crate::errors::ProxyError;

/// What the upstream task hands back: the encoded body or why there is none.
pub type RequestOutcome = Result<Vec<u8>, ProxyError>;

/// Values fixed when a request arrives.
#[derive(Debug, Clone, Copy)]
pub struct RequestScope {
    pub started: Instant,
    pub deadline: Instant,
    pub window: NonZeroUsize,
}

impl RequestScope {
    pub fn begin(window: NonZeroUsize, budget: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: started + budget,
            window,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Shared request handler state.
#[derive(Clone)]
pub struct QuoteProxy {
    provider: Arc<dyn QuoteProvider>,
    window: NonZeroUsize,
    request_timeout: Duration,
}

impl QuoteProxy {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        window: NonZeroUsize,
        request_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            window,
            request_timeout,
        }
    }

    /// Answers one request to `/`.
    pub async fn respond(&self, uri: &Uri) -> Response {
        let scope = RequestScope::begin(self.window, self.request_timeout);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(report_outcome(Arc::clone(&self.provider), scope, tx));

        let outcome = match timeout_at(scope.deadline, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(ProxyError::TaskAborted),
            Err(_) => Err(ProxyError::Timeout {
                deadline: self.request_timeout,
            }),
        };

        self.write_response(outcome, &scope, uri)
    }

    fn write_response(
        &self,
        outcome: RequestOutcome,
        scope: &RequestScope,
        uri: &Uri,
    ) -> Response {
        let elapsed_ms = scope.elapsed_ms();
        match outcome {
            Ok(body) => {
                info!(%uri, elapsed_ms, bytes = body.len(), "served quote series");
                (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response()
            }
            Err(err) if err.is_timeout() => {
                warn!(
                    %uri,
                    upstream = %self.provider.endpoint(),
                    elapsed_ms,
                    error = %err,
                    "upstream request timed out"
                );
                status_only(err.status())
            }
            Err(err) => {
                error!(%uri, elapsed_ms, error = %err, "upstream request failed");
                status_only(err.status())
            }
        }
    }
}

/// Fetch, window and encode. The deadline is handed to the provider so the
/// upstream call stops on its own once the race is lost.
pub async fn run_pipeline(
    provider: &dyn QuoteProvider,
    scope: RequestScope,
) -> Result<Vec<u8>, ProxyError> {
    let series = provider.fetch_daily_series(scope.deadline).await?;
    let windowed = series.window_last_n_days(scope.window.get())?;
    Ok(windowed.encode()?)
}

async fn report_outcome(
    provider: Arc<dyn QuoteProvider>,
    scope: RequestScope,
    tx: oneshot::Sender<RequestOutcome>,
) {
    let outcome = AssertUnwindSafe(run_pipeline(provider.as_ref(), scope))
        .catch_unwind()
        .await
        .unwrap_or(Err(ProxyError::TaskAborted));

    if tx.send(outcome).is_err() {
        debug!(
            elapsed_ms = scope.elapsed_ms(),
            "response already written, dropping late upstream result"
        );
    }
}

fn status_only(status: StatusCode) -> Response {
    (status, status.canonical_reason().unwrap_or_default()).into_response()
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeMap,
        sync::atomic::{AtomicBool, Ordering},
    };

    use async_trait::async_trait;
    use axum::body::to_bytes;
    use quote_ingestor::{
        models::{daily_bar::DailyBar, metadata::QuoteMetadata, quote_series::QuoteSeries},
        providers::{ApiSnafu, ProviderError},
    };

    use super::*;

    const DEADLINE: Duration = Duration::from_secs(60);

    fn three_days() -> QuoteSeries {
        let bars: BTreeMap<_, _> = [
            ("2023-06-07", 10.0),
            ("2023-06-08", 20.0),
            ("2023-06-09", 30.0),
        ]
        .into_iter()
        .map(|(date, close)| (date.to_string(), DailyBar::from_close(close)))
        .collect();
        QuoteSeries::new(QuoteMetadata::default(), bars).unwrap()
    }

    enum Behaviour {
        Series(QuoteSeries),
        ApiError,
        Panic,
        Stall { finished: Arc<AtomicBool> },
    }

    struct StubProvider(Behaviour);

    #[async_trait]
    impl QuoteProvider for StubProvider {
        async fn fetch_daily_series(&self, deadline: Instant) -> Result<QuoteSeries, ProviderError> {
            match &self.0 {
                Behaviour::Series(series) => Ok(series.clone()),
                Behaviour::ApiError => ApiSnafu {
                    message: "Invalid API call",
                }
                .fail(),
                Behaviour::Panic => panic!("provider blew up"),
                Behaviour::Stall { finished } => {
                    // ignores the deadline for twice as long as it should
                    tokio::time::sleep_until(deadline + DEADLINE).await;
                    finished.store(true, Ordering::SeqCst);
                    Ok(three_days())
                }
            }
        }

        fn endpoint(&self) -> String {
            "stub".to_string()
        }
    }

    fn proxy(behaviour: Behaviour, window: usize) -> QuoteProxy {
        QuoteProxy::new(
            Arc::new(StubProvider(behaviour)),
            NonZeroUsize::new(window).unwrap(),
            DEADLINE,
        )
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn completed_upstream_is_served_windowed() {
        let response = proxy(Behaviour::Series(three_days()), 2)
            .respond(&Uri::from_static("/"))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        let days = body["Time Series (Daily)"].as_object().unwrap();
        assert_eq!(days.len(), 2);
        assert!(days.contains_key("2023-06-09"));
        assert_eq!(body["ClosingAverage"], "25.00");
    }

    #[tokio::test]
    async fn provider_error_is_a_bad_gateway_without_details() {
        let response = proxy(Behaviour::ApiError, 2)
            .respond(&Uri::from_static("/"))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_text(response).await, "Bad Gateway");
    }

    #[tokio::test]
    async fn panicking_task_is_a_bad_gateway() {
        let response = proxy(Behaviour::Panic, 2)
            .respond(&Uri::from_static("/"))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_wins_and_late_result_is_dropped() {
        let finished = Arc::new(AtomicBool::new(false));
        let provider: Arc<dyn QuoteProvider> = Arc::new(StubProvider(Behaviour::Stall {
            finished: Arc::clone(&finished),
        }));
        let proxy = QuoteProxy::new(Arc::clone(&provider), NonZeroUsize::MIN, DEADLINE);

        let started = Instant::now();
        let response = proxy.respond(&Uri::from_static("/")).await;

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert!(started.elapsed() >= DEADLINE);
        assert!(started.elapsed() < DEADLINE + Duration::from_secs(1));
        assert_eq!(body_text(response).await, "Gateway Timeout");
        assert!(!finished.load(Ordering::SeqCst));

        // the abandoned task still runs to completion and lets go of the provider
        tokio::time::sleep(DEADLINE * 2).await;
        assert!(finished.load(Ordering::SeqCst));
        drop(proxy);
        assert_eq!(Arc::strong_count(&provider), 1);
    }
}
