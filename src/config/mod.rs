// Re-exports so callers can "use crate::config::*".
pub mod config;
pub mod etsy;
pub mod logging;
pub mod store;

pub use config::*;
pub use etsy::*;
pub use logging::*;
pub use store::*;
