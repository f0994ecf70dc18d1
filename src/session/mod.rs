//! Session management

pub mod backend;
pub mod ledger;
pub mod store;

pub use backend::{KvBackend, MemoryBackend};
pub use ledger::RefreshLedger;
pub use store::{generate_session_id, SessionRecord, SessionStore};
