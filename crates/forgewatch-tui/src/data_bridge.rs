//! Data bridge: runs backend calls off the event loop.
//!
//! Each call is spawned as its own task and its outcome is sent back
//! through the action channel. Nothing is cancelled; screens drop stale
//! results by sequence number.

use std::future::Future;

use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use forgewatch_core::CoreError;

use crate::action::Action;

/// Spawn `request` and send `wrap(result)` when it completes.
pub fn spawn_request<T, F, W>(tx: &UnboundedSender<Action>, request: F, wrap: W)
where
    T: Send + 'static,
    F: Future<Output = Result<T, CoreError>> + Send + 'static,
    W: FnOnce(Result<T, String>) -> Action + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = request.await.map_err(|e| {
            warn!(error = %e, "backend request failed");
            e.to_string()
        });
        let _ = tx.send(wrap(result));
    });
}
