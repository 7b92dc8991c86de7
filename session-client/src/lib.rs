pub mod error;
pub mod gate;
pub mod session;
pub mod storage;

pub use error::ClientError;
pub use gate::{GateDecision, GateRequirement, SessionState};
pub use session::{Session, SessionManager};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};
