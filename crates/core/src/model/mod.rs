mod ledger;
mod progress;
mod session;

pub use ledger::{Attribute, ChecklistItem, Ledger, LedgerError};
pub use progress::{ItemPatch, ItemResult, ProgressRecord, SessionMeta};
pub use session::{
    SESSION_ID_SEPARATOR, Session, SessionError, SessionId, SessionIdScheme, make_session_id,
};
