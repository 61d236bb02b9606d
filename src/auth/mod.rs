pub mod guard;

// Re-export from guard.rs so we can do "use crate::auth::AuthGuard;"
pub use guard::{AuthGuard, Credentials};
