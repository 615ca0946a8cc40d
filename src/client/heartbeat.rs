use crate::client::error_sink::ErrorSink;
use crate::client::session::Session;
use crate::core::kernel::{next_salt, RequestSigner, RestClient};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Synthetic error code recorded when a heartbeat cycle fails before the
/// server could answer (network failure, signing failure).
pub const HEARTBEAT_LOCAL_ERROR: i64 = -1;

/// Everything a heartbeat cycle needs, shared with the owning client.
pub(crate) struct HeartbeatContext<R> {
    pub rest: Arc<R>,
    pub signer: RequestSigner,
    pub session: Session,
    pub errors: Arc<ErrorSink>,
    pub app_id: String,
}

/// Handle to the background keep-alive task
///
/// The task is cancelled through a watch channel observed inside the loop's
/// `select!`, so shutdown is immediate rather than bounded by one interval.
/// Dropping the handle leaves the task running until the session
/// disconnects; call [`HeartbeatHandle::stop`] for a clean join.
#[derive(Debug)]
pub struct HeartbeatHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl HeartbeatHandle {
    /// Spawn the keep-alive loop.
    ///
    /// Sends one heartbeat immediately, then one per `interval` while the
    /// session stays connected and no cancellation arrives. Cycle failures
    /// are recorded and never stop the loop.
    pub(crate) fn spawn<R: RestClient + 'static>(
        ctx: HeartbeatContext<R>,
        interval: Duration,
    ) -> Self {
        let (shutdown, mut cancelled) = watch::channel(false);

        let task = tokio::spawn(async move {
            loop {
                if !ctx.session.is_connected() {
                    debug!("session disconnected, heartbeat loop exiting");
                    break;
                }

                run_cycle(&ctx).await;

                tokio::select! {
                    changed = cancelled.changed() => {
                        if changed.is_err() || *cancelled.borrow() {
                            debug!("heartbeat loop cancelled");
                            break;
                        }
                    }
                    () = tokio::time::sleep(interval) => {}
                }
            }
        });

        Self { shutdown, task }
    }

    /// Request cancellation without waiting for the task to finish.
    pub fn cancel(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Cancel the loop and wait for the task to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// One keep-alive round trip. Best-effort: every failure is recorded and
/// swallowed so the loop survives transient outages.
async fn run_cycle<R: RestClient>(ctx: &HeartbeatContext<R>) {
    let token = ctx.session.token();
    let salt = next_salt();

    let sign = match ctx.signer.sign(&[&token, &salt]) {
        Ok(sign) => sign,
        Err(e) => {
            warn!("heartbeat signing failed: {}", e);
            ctx.errors.record(HEARTBEAT_LOCAL_ERROR, e.to_string());
            return;
        }
    };

    let payload = json!({
        "app_id": ctx.app_id,
        "session": token,
        "salt": salt,
        "sign": sign,
    });

    match ctx.rest.post("heartbeat", &payload).await {
        Ok(response) => {
            let status = response.get("status").and_then(|s| s.as_i64()).unwrap_or(-1);
            if status != 0 {
                let err_no = response.get("err_no").and_then(|v| v.as_i64()).unwrap_or(status);
                let err_info = response
                    .get("err_info")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown server error")
                    .to_string();
                warn!("heartbeat rejected: {} - {}", err_no, err_info);
                ctx.errors.record(err_no, err_info);
            }
        }
        Err(e) => {
            warn!("heartbeat request failed: {}", e);
            ctx.errors.record(HEARTBEAT_LOCAL_ERROR, e.to_string());
        }
    }
}
