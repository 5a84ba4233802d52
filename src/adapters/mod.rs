// Adapters layer: concrete implementations of the domain ports.

pub mod analytics;
pub mod order_store;
pub mod partitioner;
pub mod session_store;

pub use analytics::CookieAnalytics;
pub use order_store::{JsonFileOrderRepository, MemoryOrderRepository};
pub use partitioner::DeliveryPartitioner;
pub use session_store::{FileSessionStore, MemorySessionStore};
