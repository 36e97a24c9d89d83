//! Completion hooks run on the submitter's side.

use super::reply::{OperationFailure, Token};
use crate::script_db::{ScriptId, ScriptRecord};

/// Callbacks invoked by `QueryHandler` when a reply is delivered.
///
/// Success hooks default to doing nothing. `on_error` defaults to re-raising
/// the failure, so a forwarded panic brings the caller down unless the
/// implementation handles it.
pub trait QueryCallbacks<C> {
    fn on_query_complete(&mut self, token: Token, cookie: C, records: Vec<ScriptRecord>) {
        let _ = (token, cookie, records);
    }

    fn on_insert_complete(&mut self, token: Token, cookie: C, id: ScriptId) {
        let _ = (token, cookie, id);
    }

    fn on_update_complete(&mut self, token: Token, cookie: C, rows: u64) {
        let _ = (token, cookie, rows);
    }

    fn on_delete_complete(&mut self, token: Token, cookie: C, rows: u64) {
        let _ = (token, cookie, rows);
    }

    fn on_error(&mut self, token: Token, cookie: C, error: OperationFailure) {
        let _ = (token, cookie);
        error.raise()
    }
}
