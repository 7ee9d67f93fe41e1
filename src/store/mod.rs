//! Durable per-session verdict state.

mod sessions;

pub use sessions::{SessionRecord, SessionStats, SessionStatus, SessionStore, StoreError};
