//! Adapters for the application ports.

mod http_remote;
mod in_memory_remote;
mod system_clock;

pub use http_remote::HttpRemoteActor;
pub use in_memory_remote::InMemoryRemoteActor;
pub use system_clock::SystemClock;
