pub mod checkout;
pub mod steps;
pub mod storage;

pub use crate::domain::cart::{Cart, SessionCart};
pub use crate::domain::model::{Address, DeliveryGroup, Order, Price, PricingOptions};
pub use crate::domain::ports::{Analytics, OrderRepository, Partitioner, SessionStore};
pub use crate::domain::request::{RequestContext, Session, SessionRecord};
pub use crate::utils::error::Result;
