//! # Transaction Journal & Undo
//!
//! Every filesystem mutation the placement engine performs is appended to
//! a durable session log and can be replayed in reverse to restore prior
//! state.
//!
//! - `types` - operation records and sessions
//! - `store` - group-commit session persistence under `transactions/`
//! - `undo` - reverse replay with per-operation failure isolation

pub mod store;
pub mod types;
pub mod undo;

pub use store::{list_sessions, load_session, transactions_dir, TransactionJournal};
pub use types::{OperationKind, OperationRecord, Session};
pub use undo::{UndoEngine, UndoReport};
