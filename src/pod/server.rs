//! Unix-socket pod server. One JSON request per line, one JSON response per line.
//!
//! Requests on the same connection run concurrently and may complete out of order; callers
//! correlate responses by `id`. A half-closed connection still receives its pending responses;
//! in-flight calls are canceled when the peer stops accepting writes or the server shuts down.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Semaphore, mpsc};

use super::dispatch::MongoPod;
use super::message::{Op, Request, Response};
use crate::errors::PodError;
use crate::query::CallContext;

// Per-connection bounds on concurrent invocations and queued responses.
const MAX_IN_FLIGHT: usize = 64;
const RESPONSE_BUFFER: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Deadline applied to every invocation.
    pub call_timeout: Option<Duration>,
}

/// Removes a stale socket file and binds `path`.
///
/// # Errors
/// Returns an I/O error if the path cannot be bound.
pub fn bind(path: &Path) -> std::io::Result<UnixListener> {
    match std::fs::remove_file(path) {
        Ok(()) => log::info!("removed stale socket {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    UnixListener::bind(path)
}

/// Accepts connections until `shutdown` is canceled.
///
/// # Errors
/// Returns an I/O error if accepting fails.
pub async fn serve(
    listener: UnixListener,
    pod: Arc<MongoPod>,
    opts: ServerOptions,
    shutdown: CallContext,
) -> std::io::Result<()> {
    loop {
        let Ok(accepted) = shutdown.run(listener.accept()).await else {
            log::info!("pod server shutting down");
            return Ok(());
        };
        let (stream, _) = accepted?;
        let conn_ctx = shutdown.child();
        let pod = Arc::clone(&pod);
        let opts = opts.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, pod, opts, conn_ctx.clone()).await {
                log::warn!("pod connection ended with error: {e}");
            }
            conn_ctx.cancel();
        });
    }
}

async fn handle_connection(
    stream: UnixStream,
    pod: Arc<MongoPod>,
    opts: ServerOptions,
    conn_ctx: CallContext,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let (tx, mut rx) = mpsc::channel::<Response>(RESPONSE_BUFFER);
    let in_flight = Arc::new(Semaphore::new(MAX_IN_FLIGHT));

    let writer_ctx = conn_ctx.clone();
    let writer = tokio::spawn(async move {
        let res = async {
            while let Some(resp) = rx.recv().await {
                let mut line = serde_json::to_vec(&resp).map_err(std::io::Error::other)?;
                line.push(b'\n');
                write_half.write_all(&line).await?;
            }
            write_half.shutdown().await
        }
        .await;
        // Peer is gone: abandon whatever is still running.
        if res.is_err() {
            writer_ctx.cancel();
        }
        res
    });

    let mut lines = BufReader::new(read_half).lines();
    // EOF may be a half-close; in-flight calls still get their responses.
    while let Ok(next) = conn_ctx.run(lines.next_line()).await {
        let Some(line) = next? else { break };
        if line.trim().is_empty() {
            continue;
        }
        let req: Request = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let resp = Response::error(None, &PodError::Decode(format!("request: {e}")));
                if tx.send(resp).await.is_err() {
                    break;
                }
                continue;
            }
        };
        match req.op {
            Op::Describe => {
                let value = serde_json::to_value(pod.describe()).map_err(std::io::Error::other)?;
                if tx.send(Response::done(req.id, value)).await.is_err() {
                    break;
                }
            }
            Op::Invoke => {
                let Ok(permit) = Arc::clone(&in_flight).acquire_owned().await else { break };
                let mut ctx = conn_ctx.child();
                if let Some(t) = opts.call_timeout {
                    ctx = ctx.with_timeout(t);
                }
                let pod = Arc::clone(&pod);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let var = req.var.unwrap_or_default();
                    let resp = match pod.invoke(&ctx, &var, &req.args).await {
                        Ok(v) => Response::done(req.id, v),
                        Err(e) => {
                            log::debug!("{var} failed: {e}");
                            Response::error(req.id, &e)
                        }
                    };
                    let _ = tx.send(resp).await;
                    drop(permit);
                });
            }
        }
    }
    // The writer finishes once every in-flight call has sent its response.
    drop(tx);
    writer.await.map_err(std::io::Error::other)?
}
