use crate::domain::model::Order;
use crate::domain::ports::OrderRepository;
use crate::utils::error::{CheckoutError, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

fn assign_id(mut order: Order) -> Order {
    if order.id.is_none() {
        order.id = Some(Uuid::new_v4());
    }
    order
}

#[derive(Debug, Default)]
pub struct MemoryOrderRepository {
    orders: Mutex<Vec<Order>>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Order> {
        self.orders.lock().await.clone()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn save(&self, order: Order) -> Result<Order> {
        let order = assign_id(order);
        let mut orders = self.orders.lock().await;
        match orders.iter_mut().find(|stored| stored.id == order.id) {
            Some(stored) => *stored = order.clone(),
            None => orders.push(order.clone()),
        }
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>> {
        let orders = self.orders.lock().await;
        Ok(orders.iter().find(|order| order.id == Some(id)).cloned())
    }
}

/// Writes each order to `<base_path>/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileOrderRepository {
    base_path: PathBuf,
}

impl JsonFileOrderRepository {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn order_path(&self, id: Uuid) -> PathBuf {
        self.base_path.join(format!("{}.json", id))
    }
}

#[async_trait]
impl OrderRepository for JsonFileOrderRepository {
    async fn save(&self, order: Order) -> Result<Order> {
        let order = assign_id(order);
        let id = order.id.ok_or_else(|| CheckoutError::PersistenceError {
            message: "order has no id".to_string(),
        })?;

        fs::create_dir_all(&self.base_path)?;
        let path = self.order_path(id);
        fs::write(&path, serde_json::to_vec_pretty(&order)?)?;
        tracing::debug!("Order written to {}", path.display());
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>> {
        let path = self.order_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&data)?))
    }
}
