//! Session state for the PIN-authenticated household login.

mod session;
mod storage;

pub use session::{AuthState, SessionManager};
pub use storage::{LocalStore, AUTH_FLAG_KEY};
