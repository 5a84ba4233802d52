use super::{stored_str, CheckoutStep, FormData, StepContext, StepKind, StepOutcome};
use crate::domain::model::{
    DeliveryGroup, DeliveryKind, DeliveryMethod, Order, OrderedDeliveryGroup, StorageSlice,
};
use crate::utils::error::Result;
use crate::utils::validation::validate_email;
use serde_json::Value;

/// Email delivery for one digital delivery group.
#[derive(Debug, Clone)]
pub struct DigitalDeliveryStep {
    key: String,
    index: usize,
    group: DeliveryGroup,
    default_email: Option<String>,
}

impl DigitalDeliveryStep {
    pub fn storage_key(index: usize) -> String {
        format!("digital_{}", index)
    }

    pub fn new(index: usize, mut group: DeliveryGroup, default_email: Option<String>) -> Self {
        group.delivery_method = Some(DeliveryMethod::digital(group.currency.clone()));
        Self {
            key: Self::storage_key(index),
            index,
            group,
            default_email,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn email(&self, slice: &StorageSlice) -> Option<String> {
        stored_str(slice, "email")
            .map(str::to_string)
            .or_else(|| self.default_email.clone())
    }
}

impl CheckoutStep for DigitalDeliveryStep {
    fn key(&self) -> &str {
        &self.key
    }

    fn kind(&self) -> StepKind {
        StepKind::DigitalDelivery
    }

    fn group(&self) -> Option<&DeliveryGroup> {
        Some(&self.group)
    }

    fn validate(&self, slice: &StorageSlice, _ctx: &StepContext) -> Result<()> {
        validate_email("email", &self.email(slice).unwrap_or_default())
    }

    fn process(
        &self,
        slice: &mut StorageSlice,
        form: &FormData,
        _ctx: &StepContext,
    ) -> Result<StepOutcome> {
        let email = form
            .get("email")
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .or_else(|| self.default_email.clone())
            .unwrap_or_default();
        validate_email("email", &email)?;
        slice.insert("email".to_string(), Value::String(email));
        Ok(StepOutcome::Advance)
    }

    fn add_to_order(&self, slice: &StorageSlice, order: &mut Order) {
        order.groups.push(OrderedDeliveryGroup {
            kind: DeliveryKind::Digital,
            items: self.group.items.clone(),
            shipping_address: None,
            delivery_email: self.email(slice).filter(|email| !email.is_empty()),
            method_name: "digital".to_string(),
            delivery_price: self.group.delivery_price(),
        });
    }
}
