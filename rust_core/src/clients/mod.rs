pub mod retry;
pub mod world_rugby;

// Re-export commonly used types
pub use retry::execute_with_retry;
pub use world_rugby::{WorldRugbyClient, WorldRugbyClientConfig, DEFAULT_BASE_URL};
