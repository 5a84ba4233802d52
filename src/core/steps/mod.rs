//! Checkout steps. Each step owns one storage slice (lent to it by the manager on
//! every call) and at most one delivery group.

pub mod billing;
pub mod digital;
pub mod shipping;
pub mod summary;

pub use billing::BillingStep;
pub use digital::DigitalDeliveryStep;
pub use shipping::ShippingStep;
pub use summary::SummaryStep;

use crate::domain::model::{Address, DeliveryGroup, Order, Price, StorageSlice};
use crate::utils::error::{CheckoutError, Result};
use crate::utils::validation::require_field;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A submitted form: field name to raw string value.
pub type FormData = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Billing,
    Shipping,
    DigitalDelivery,
    Summary,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::Billing => "billing",
            StepKind::Shipping => "shipping",
            StepKind::DigitalDelivery => "digital delivery",
            StepKind::Summary => "summary",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Data stored; move on to the next incomplete step.
    Advance,
    /// The customer confirmed the summary; the order should be placed.
    PlaceOrder,
}

/// Read-only view of the whole checkout handed to a step by the manager.
#[derive(Debug, Clone, PartialEq)]
pub struct StepContext {
    pub authenticated: bool,
    pub user_email: Option<String>,
    pub billing_address: Address,
    pub anonymous_user_email: Option<String>,
    pub total: Price,
}

pub trait CheckoutStep: Send + Sync + fmt::Debug {
    /// Storage key of this step's slice, e.g. `billing` or `shipping_1`.
    fn key(&self) -> &str;

    fn kind(&self) -> StepKind;

    fn group(&self) -> Option<&DeliveryGroup> {
        None
    }

    /// `Ok` once the stored data is complete enough to move past this step.
    fn validate(&self, slice: &StorageSlice, ctx: &StepContext) -> Result<()>;

    /// Validates a submitted form and writes the result into `slice`.
    fn process(
        &self,
        slice: &mut StorageSlice,
        form: &FormData,
        ctx: &StepContext,
    ) -> Result<StepOutcome>;

    /// Copies this step's data into the order. Must tolerate an empty slice.
    fn add_to_order(&self, slice: &StorageSlice, order: &mut Order);
}

pub(crate) fn stored_str<'a>(slice: &'a StorageSlice, key: &str) -> Option<&'a str> {
    slice.get(key).and_then(Value::as_str)
}

pub(crate) fn stored_address(slice: &StorageSlice) -> Option<Address> {
    match slice.get("address") {
        Some(Value::Object(data)) => Some(Address::from_data(data)),
        _ => None,
    }
}

/// `None` when the form carries no address field at all.
pub(crate) fn address_from_form(form: &FormData) -> Option<Address> {
    let data: StorageSlice = Address::FIELDS
        .iter()
        .filter_map(|field| {
            form.get(*field)
                .map(|value| (field.to_string(), Value::String(value.trim().to_string())))
        })
        .collect();
    if data.is_empty() {
        None
    } else {
        Some(Address::from_data(&data))
    }
}

pub(crate) fn validate_address(address: &Address) -> Result<()> {
    require_field("first_name", &address.first_name)?;
    require_field("last_name", &address.last_name)?;
    require_field("street_address_1", &address.street_address_1)?;
    require_field("city", &address.city)?;
    require_field("postal_code", &address.postal_code)?;
    require_field("country", &address.country)?;
    Ok(())
}

pub(crate) fn form_flag(form: &FormData, key: &str) -> bool {
    form.get(key)
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "true" | "on" | "yes" | "1"
            )
        })
        .unwrap_or(false)
}

pub(crate) fn required_form_value<'a>(form: &'a FormData, key: &str) -> Result<&'a str> {
    let value = form.get(key).map(|value| value.trim()).unwrap_or_default();
    if value.is_empty() {
        return Err(CheckoutError::validation(key, "This field is required"));
    }
    Ok(value)
}
