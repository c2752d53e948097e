//! One accepted connection: hyper HTTP/1.1 plus a watchdog for the
//! transport bounds.
//!
//! The read clock starts at the first byte of a request head (or at accept),
//! the idle clock when the last request was handed back to hyper. A socket
//! write that makes no progress for the write bound drops the connection.

use std::{
    io,
    net::SocketAddr,
    pin::Pin,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context, Poll},
};

use axum::{Router, http::Request};
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use tokio::{
    io::{AsyncRead, AsyncWrite, ReadBuf},
    net::TcpStream,
    sync::Notify,
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing::debug;

use crate::config::Timeouts;

#[derive(Debug, Clone, Copy)]
struct Marks {
    idle_since: Instant,
    head_started: Option<Instant>,
    write_stalled: Option<Instant>,
}

#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    /// Nothing has expired; look again at this instant.
    Open(Instant),
    Idle,
    ReadExpired,
    WriteExpired,
}

/// Shared between the socket wrapper, the service and the watchdog.
struct Activity {
    in_flight: AtomicUsize,
    marks: Mutex<Marks>,
    changed: Notify,
}

impl Activity {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            in_flight: AtomicUsize::new(0),
            marks: Mutex::new(Marks {
                idle_since: now,
                head_started: Some(now),
                write_stalled: None,
            }),
            changed: Notify::new(),
        }
    }

    fn marks(&self) -> MutexGuard<'_, Marks> {
        self.marks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(self: &Arc<Self>) -> InFlight {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.marks().head_started = None;
        InFlight(Arc::clone(self))
    }

    fn bytes_read(&self) {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return;
        }
        let mut marks = self.marks();
        if marks.head_started.is_none() {
            marks.head_started = Some(Instant::now());
            drop(marks);
            self.changed.notify_one();
        }
    }

    fn write_pending(&self) {
        let mut marks = self.marks();
        if marks.write_stalled.is_none() {
            marks.write_stalled = Some(Instant::now());
            drop(marks);
            self.changed.notify_one();
        }
    }

    fn write_progressed(&self) {
        self.marks().write_stalled = None;
    }

    fn check(&self, timeouts: &Timeouts) -> Verdict {
        let now = Instant::now();
        let marks = *self.marks();
        let mut next = now + timeouts.idle;

        if let Some(stalled) = marks.write_stalled {
            let deadline = stalled + timeouts.write;
            if now >= deadline {
                return Verdict::WriteExpired;
            }
            next = next.min(deadline);
        }

        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return Verdict::Open(next);
        }

        match marks.head_started {
            Some(started) => {
                let deadline = started + timeouts.read;
                if now >= deadline {
                    return Verdict::ReadExpired;
                }
                Verdict::Open(next.min(deadline))
            }
            None => {
                let deadline = marks.idle_since + timeouts.idle;
                if now >= deadline {
                    return Verdict::Idle;
                }
                Verdict::Open(next.min(deadline))
            }
        }
    }
}

struct InFlight(Arc<Activity>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.marks().idle_since = Instant::now();
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// `TcpStream` that reports reads and stalled writes to its [`Activity`].
struct TrackedStream {
    inner: TcpStream,
    activity: Arc<Activity>,
}

impl TrackedStream {
    fn note_write(&self, pending: bool) {
        if pending {
            self.activity.write_pending();
        } else {
            self.activity.write_progressed();
        }
    }
}

impl AsyncRead for TrackedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let polled = Pin::new(&mut self.inner).poll_read(cx, buf);
        if matches!(polled, Poll::Ready(Ok(()))) && buf.filled().len() > before {
            self.activity.bytes_read();
        }
        polled
    }
}

impl AsyncWrite for TrackedStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let polled = Pin::new(&mut self.inner).poll_write(cx, buf);
        self.note_write(polled.is_pending());
        polled
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let polled = Pin::new(&mut self.inner).poll_write_vectored(cx, bufs);
        self.note_write(polled.is_pending());
        polled
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let polled = Pin::new(&mut self.inner).poll_flush(cx);
        self.note_write(polled.is_pending());
        polled
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

pub(crate) async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    timeouts: Timeouts,
    shutdown: CancellationToken,
) {
    let activity = Arc::new(Activity::new());
    let io = TokioIo::new(TrackedStream {
        inner: stream,
        activity: Arc::clone(&activity),
    });

    let service = {
        let activity = Arc::clone(&activity);
        service_fn(move |request: Request<Incoming>| {
            let router = router.clone();
            let in_flight = activity.begin();
            async move {
                let response = router.oneshot(request).await;
                drop(in_flight);
                response
            }
        })
    };

    // hyper's header timer restarts after every response; the watchdog owns the read bound
    let conn = http1::Builder::new()
        .header_read_timeout(None)
        .serve_connection(io, service);
    tokio::pin!(conn);

    let mut closing = false;
    loop {
        let wake_at = match activity.check(&timeouts) {
            Verdict::Open(at) => Some(at),
            Verdict::Idle => {
                if !closing {
                    debug!(%peer, "closing idle connection");
                    closing = true;
                    conn.as_mut().graceful_shutdown();
                }
                None
            }
            Verdict::ReadExpired => {
                debug!(%peer, read = ?timeouts.read, "request head not received in time");
                break;
            }
            Verdict::WriteExpired => {
                debug!(%peer, write = ?timeouts.write, "response write stalled");
                break;
            }
        };
        let watchdog = async move {
            match wake_at {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    debug!(%peer, error = %e, "connection ended with error");
                }
                break;
            }
            _ = shutdown.cancelled(), if !closing => {
                closing = true;
                conn.as_mut().graceful_shutdown();
            }
            _ = watchdog => {}
            _ = activity.changed.notified() => {}
        }
    }
}
