use crate::domain::cart::Cart;
use crate::domain::model::{DeliveryGroup, Order};
use crate::domain::request::{RequestContext, SessionRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Splits a cart into delivery groups. Must return the same order for the same cart,
/// since step storage keys are derived from group positions.
pub trait Partitioner: Send + Sync {
    fn partition(&self, cart: &Cart) -> Vec<DeliveryGroup>;
}

pub trait SessionStore: Send + Sync {
    /// An unknown session id yields an empty record.
    fn load(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<SessionRecord>> + Send;
    fn save(
        &self,
        session_id: &str,
        record: &SessionRecord,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists the order and returns it with its id assigned.
    async fn save(&self, order: Order) -> Result<Order>;
    async fn get(&self, id: Uuid) -> Result<Option<Order>>;
}

pub trait Analytics: Send + Sync {
    fn get_client_id(&self, request: &RequestContext) -> String;
}
