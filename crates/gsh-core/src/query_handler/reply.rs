//! Replies delivered back to the submitter.

use std::any::Any;
use std::fmt;

use crate::script_db::{ScriptId, ScriptRecord, StoreError};

/// Caller-chosen request identifier, echoed in the reply.
pub type Token = i32;

/// Normal outcome of a catalogue operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Query(Vec<ScriptRecord>),
    Insert(ScriptId),
    /// Rows updated.
    Update(u64),
    /// Rows deleted.
    Delete(u64),
}

/// Payload of a panic raised by an operation, kept as-is so it can be
/// re-raised on the submitter's side.
pub struct PanicPayload(Box<dyn Any + Send + 'static>);

impl PanicPayload {
    pub fn new(payload: Box<dyn Any + Send + 'static>) -> Self {
        Self(payload)
    }

    /// Panic message, when the payload is a string.
    pub fn message(&self) -> &str {
        if let Some(s) = self.0.downcast_ref::<&'static str>() {
            s
        } else if let Some(s) = self.0.downcast_ref::<String>() {
            s
        } else {
            "<non-string panic payload>"
        }
    }

    pub fn into_inner(self) -> Box<dyn Any + Send + 'static> {
        self.0
    }
}

impl fmt::Debug for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PanicPayload").field(&self.message()).finish()
    }
}

/// Why an operation produced no result. Any failure qualifies; the handler
/// forwards it unclassified.
#[derive(Debug, thiserror::Error)]
pub enum OperationFailure {
    /// The operation returned an error.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The operation panicked.
    #[error("operation panicked: {}", .0.message())]
    Panicked(PanicPayload),
    /// The operation never ran to completion (worker or runtime shut down).
    #[error("operation aborted before completion")]
    Aborted,
}

impl OperationFailure {
    pub(crate) fn from_join_error(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            OperationFailure::Panicked(PanicPayload::new(err.into_panic()))
        } else {
            OperationFailure::Aborted
        }
    }

    /// Panic on the current thread with this failure. A forwarded panic is
    /// resumed with its original payload.
    pub fn raise(self) -> ! {
        match self {
            OperationFailure::Panicked(payload) => std::panic::resume_unwind(payload.into_inner()),
            other => panic!("unhandled query failure: {other}"),
        }
    }
}

/// What the worker sends back for every submitted operation.
#[derive(Debug)]
pub struct Reply<C> {
    pub token: Token,
    pub cookie: C,
    pub outcome: Result<OperationResult, OperationFailure>,
}

impl<C> Reply<C> {
    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}
