//! Background worker: runs queued operations one at a time.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use super::reply::{OperationFailure, OperationResult, Reply, Token};
use crate::script_db::{ScriptDb, StoreError};

pub(crate) type OperationFuture =
    Pin<Box<dyn Future<Output = Result<OperationResult, StoreError>> + Send + 'static>>;

pub(crate) type Operation = Box<dyn FnOnce(ScriptDb) -> OperationFuture + Send + 'static>;

/// Label used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Insert,
    Update,
    Delete,
    Custom,
}

/// One queued operation plus everything needed to answer it.
pub(crate) struct WorkerArgs<C> {
    pub(crate) token: Token,
    pub(crate) kind: OperationKind,
    pub(crate) cookie: C,
    pub(crate) operation: Operation,
    pub(crate) reply_to: mpsc::UnboundedSender<Reply<C>>,
}

/// Runs operations in queue order until every sender is gone. Spawn this with tokio::spawn.
pub(crate) async fn run_worker<C: Send + 'static>(
    db: ScriptDb,
    mut queue: mpsc::UnboundedReceiver<WorkerArgs<C>>,
) {
    while let Some(args) = queue.recv().await {
        let WorkerArgs {
            token,
            kind,
            cookie,
            operation,
            reply_to,
        } = args;

        let db = db.clone();
        // Each operation runs as its own task so a panic ends at the join
        // point and comes back as a value; the next one only starts after.
        let outcome = match tokio::spawn(async move { operation(db).await }).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => Err(OperationFailure::Store(err)),
            Err(join_err) => Err(OperationFailure::from_join_error(join_err)),
        };

        match &outcome {
            Ok(_) => tracing::debug!(token, ?kind, "operation completed"),
            Err(e) => tracing::warn!(token, ?kind, "operation failed: {}", e),
        }

        if reply_to
            .send(Reply {
                token,
                cookie,
                outcome,
            })
            .is_err()
        {
            tracing::warn!(token, ?kind, "reply dropped: submitter is gone");
        }
    }
    tracing::debug!("query worker stopped");
}
