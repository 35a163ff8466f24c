pub mod history;
pub mod message;
pub mod session;
pub mod store;

pub use history::{ConversationHistory, DEFAULT_HISTORY_CAP};
pub use message::{ChatMessage, MessageAction, Sender};
pub use session::{ChatSession, SessionSummary};
pub use store::{DEFAULT_SESSION_CAP, JsonFileStore, MemoryStore, SessionStore, StoreError};
