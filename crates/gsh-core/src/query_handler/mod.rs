//! Catalogue operations on a single background worker.
//!
//! `QueryHandler` queues operations for one worker task that owns the
//! catalogue handle and runs them strictly in submission order. Every
//! submission gets exactly one `Reply`, carrying the caller's token and
//! cookie, whether the operation returned normally, returned an error, or
//! panicked. Replies are delivered through `QueryCallbacks` on whichever task
//! drives `dispatch_next` / `dispatch_pending`, normally the one that
//! submitted the work.

mod callbacks;
mod reply;
mod worker;

pub use callbacks::QueryCallbacks;
pub use reply::{OperationFailure, OperationResult, PanicPayload, Reply, Token};
pub use worker::OperationKind;

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::script_db::{NewScript, ScriptDb, ScriptSelection, ScriptUpdate, StoreError};
use worker::{run_worker, Operation, OperationFuture, WorkerArgs};

/// Submits catalogue operations to a dedicated worker and delivers the replies.
///
/// Must be created inside a tokio runtime.
pub struct QueryHandler<C> {
    queue: mpsc::UnboundedSender<WorkerArgs<C>>,
    reply_tx: mpsc::UnboundedSender<Reply<C>>,
    replies: mpsc::UnboundedReceiver<Reply<C>>,
    worker: JoinHandle<()>,
    in_flight: usize,
}

impl<C: Send + 'static> QueryHandler<C> {
    /// Spawn the worker; it owns `db` for the lifetime of the handler.
    pub fn new(db: ScriptDb) -> Self {
        let (queue, queue_rx) = mpsc::unbounded_channel();
        let (reply_tx, replies) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(db, queue_rx));
        Self {
            queue,
            reply_tx,
            replies,
            worker,
            in_flight: 0,
        }
    }

    /// Number of submitted operations whose reply has not been delivered yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Queue `operation` behind everything submitted before it. Never blocks.
    pub fn submit<F, Fut>(&mut self, token: Token, cookie: C, operation: F)
    where
        F: FnOnce(ScriptDb) -> Fut + Send + 'static,
        Fut: Future<Output = Result<OperationResult, StoreError>> + Send + 'static,
    {
        self.enqueue(token, cookie, OperationKind::Custom, boxed(operation));
    }

    /// Query the selected rows; completes with `on_query_complete`.
    pub fn start_query(&mut self, token: Token, cookie: C, selection: ScriptSelection) {
        let op = boxed(move |db: ScriptDb| async move {
            db.query(&selection).await.map(OperationResult::Query)
        });
        self.enqueue(token, cookie, OperationKind::Query, op);
    }

    /// Insert a row; completes with `on_insert_complete`.
    pub fn start_insert(&mut self, token: Token, cookie: C, script: NewScript) {
        let op = boxed(move |db: ScriptDb| async move {
            db.insert(&script).await.map(OperationResult::Insert)
        });
        self.enqueue(token, cookie, OperationKind::Insert, op);
    }

    /// Update the selected rows; completes with `on_update_complete`.
    pub fn start_update(
        &mut self,
        token: Token,
        cookie: C,
        selection: ScriptSelection,
        changes: ScriptUpdate,
    ) {
        let op = boxed(move |db: ScriptDb| async move {
            db.update(&selection, &changes)
                .await
                .map(OperationResult::Update)
        });
        self.enqueue(token, cookie, OperationKind::Update, op);
    }

    /// Delete the selected rows; completes with `on_delete_complete`.
    pub fn start_delete(&mut self, token: Token, cookie: C, selection: ScriptSelection) {
        let op = boxed(move |db: ScriptDb| async move {
            db.delete(&selection).await.map(OperationResult::Delete)
        });
        self.enqueue(token, cookie, OperationKind::Delete, op);
    }

    fn enqueue(&mut self, token: Token, cookie: C, kind: OperationKind, operation: Operation) {
        let args = WorkerArgs {
            token,
            kind,
            cookie,
            operation,
            reply_to: self.reply_tx.clone(),
        };
        self.in_flight += 1;
        tracing::debug!(token, ?kind, "operation queued");

        if let Err(mpsc::error::SendError(args)) = self.queue.send(args) {
            // Worker is gone; answer here so the caller still gets its reply.
            tracing::warn!(token, ?kind, "query worker unavailable");
            let _ = self.reply_tx.send(Reply {
                token: args.token,
                cookie: args.cookie,
                outcome: Err(OperationFailure::Aborted),
            });
        }
    }

    /// Wait for the next reply. `None` once nothing is in flight.
    pub async fn next_reply(&mut self) -> Option<Reply<C>> {
        if self.in_flight == 0 {
            return None;
        }
        let reply = self.replies.recv().await?;
        self.in_flight -= 1;
        Some(reply)
    }

    /// Route `reply` to the matching callback; failures go to `on_error`.
    pub fn deliver<H: QueryCallbacks<C>>(&self, reply: Reply<C>, callbacks: &mut H) {
        let Reply {
            token,
            cookie,
            outcome,
        } = reply;
        match outcome {
            Ok(OperationResult::Query(records)) => {
                callbacks.on_query_complete(token, cookie, records)
            }
            Ok(OperationResult::Insert(id)) => callbacks.on_insert_complete(token, cookie, id),
            Ok(OperationResult::Update(rows)) => callbacks.on_update_complete(token, cookie, rows),
            Ok(OperationResult::Delete(rows)) => callbacks.on_delete_complete(token, cookie, rows),
            Err(failure) => callbacks.on_error(token, cookie, failure),
        }
    }

    /// Wait for one reply and deliver it. Returns `false` if nothing was in flight.
    pub async fn dispatch_next<H: QueryCallbacks<C>>(&mut self, callbacks: &mut H) -> bool {
        match self.next_reply().await {
            Some(reply) => {
                self.deliver(reply, callbacks);
                true
            }
            None => false,
        }
    }

    /// Deliver every reply that has already arrived, without waiting.
    pub fn dispatch_pending<H: QueryCallbacks<C>>(&mut self, callbacks: &mut H) -> usize {
        let mut delivered = 0;
        while self.in_flight > 0 {
            let Ok(reply) = self.replies.try_recv() else {
                break;
            };
            self.in_flight -= 1;
            self.deliver(reply, callbacks);
            delivered += 1;
        }
        delivered
    }

    /// Deliver replies until nothing is in flight.
    pub async fn dispatch_all<H: QueryCallbacks<C>>(&mut self, callbacks: &mut H) {
        while self.dispatch_next(callbacks).await {}
    }

    /// Stop accepting work and wait for the worker to drain its queue.
    /// Replies not yet delivered are discarded.
    pub async fn shutdown(self) {
        let Self { queue, worker, .. } = self;
        drop(queue);
        if let Err(e) = worker.await {
            tracing::warn!("query worker ended abnormally: {}", e);
        }
    }
}

fn boxed<F, Fut>(operation: F) -> Operation
where
    F: FnOnce(ScriptDb) -> Fut + Send + 'static,
    Fut: Future<Output = Result<OperationResult, StoreError>> + Send + 'static,
{
    Box::new(move |db: ScriptDb| -> OperationFuture { Box::pin(operation(db)) })
}
