pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::Cli;

pub use adapters::{
    CookieAnalytics, DeliveryPartitioner, FileSessionStore, JsonFileOrderRepository,
    MemoryOrderRepository, MemorySessionStore,
};
pub use config::CheckoutConfig;
pub use core::checkout::{Checkout, CheckoutSettings, STORAGE_SESSION_KEY};
pub use core::steps::{CheckoutStep, FormData, StepKind, StepOutcome};
pub use core::storage::CheckoutStorage;
pub use utils::error::{CheckoutError, Result};
