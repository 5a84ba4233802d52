use super::{
    address_from_form, form_flag, required_form_value, stored_address, stored_str,
    validate_address, CheckoutStep, FormData, StepContext, StepKind, StepOutcome,
};
use crate::domain::model::{
    Address, DeliveryGroup, DeliveryKind, DeliveryMethod, Order, OrderedDeliveryGroup,
    StorageSlice,
};
use crate::utils::error::{CheckoutError, Result};
use serde_json::Value;

/// Delivery address and shipping method for one physical delivery group.
#[derive(Debug, Clone)]
pub struct ShippingStep {
    key: String,
    index: usize,
    group: DeliveryGroup,
    methods: Vec<DeliveryMethod>,
    default_address: Address,
}

impl ShippingStep {
    pub fn storage_key(index: usize) -> String {
        format!("shipping_{}", index)
    }

    /// The method stored in `slice` (if still offered) is applied to the group,
    /// so group totals include delivery.
    pub fn new(
        index: usize,
        mut group: DeliveryGroup,
        slice: &StorageSlice,
        methods: Vec<DeliveryMethod>,
        default_address: Address,
    ) -> Self {
        group.delivery_method = stored_str(slice, "method")
            .and_then(|name| methods.iter().find(|method| method.name == name))
            .cloned();
        Self {
            key: Self::storage_key(index),
            index,
            group,
            methods,
            default_address,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn methods(&self) -> &[DeliveryMethod] {
        &self.methods
    }

    /// Stored address, or the billing address when none was entered.
    pub fn address(&self, slice: &StorageSlice) -> Address {
        stored_address(slice).unwrap_or_else(|| self.default_address.clone())
    }

    fn find_method(&self, name: &str) -> Result<&DeliveryMethod> {
        self.methods
            .iter()
            .find(|method| method.name == name)
            .ok_or_else(|| {
                CheckoutError::validation(
                    "method",
                    format!("'{}' is not an available shipping method", name),
                )
            })
    }
}

impl CheckoutStep for ShippingStep {
    fn key(&self) -> &str {
        &self.key
    }

    fn kind(&self) -> StepKind {
        StepKind::Shipping
    }

    fn group(&self) -> Option<&DeliveryGroup> {
        Some(&self.group)
    }

    fn validate(&self, slice: &StorageSlice, _ctx: &StepContext) -> Result<()> {
        validate_address(&self.address(slice))?;
        let name = stored_str(slice, "method")
            .ok_or_else(|| CheckoutError::validation("method", "Choose a shipping method"))?;
        self.find_method(name)?;
        Ok(())
    }

    fn process(
        &self,
        slice: &mut StorageSlice,
        form: &FormData,
        ctx: &StepContext,
    ) -> Result<StepOutcome> {
        let method = self.find_method(required_form_value(form, "method")?)?;

        let address = if form_flag(form, "use_billing_address") {
            None
        } else {
            address_from_form(form)
        };
        match &address {
            Some(address) => validate_address(address)?,
            None => validate_address(&ctx.billing_address)?,
        }

        let stored = match address {
            Some(address) => Value::Object(address.as_data()),
            None => Value::Null,
        };
        slice.insert("address".to_string(), stored);
        slice.insert("method".to_string(), Value::String(method.name.clone()));
        Ok(StepOutcome::Advance)
    }

    fn add_to_order(&self, slice: &StorageSlice, order: &mut Order) {
        let address = self.address(slice);
        order.groups.push(OrderedDeliveryGroup {
            kind: DeliveryKind::Physical,
            items: self.group.items.clone(),
            shipping_address: (!address.is_empty()).then_some(address),
            delivery_email: None,
            method_name: self
                .group
                .delivery_method
                .as_ref()
                .map(|method| method.name.clone())
                .unwrap_or_default(),
            delivery_price: self.group.delivery_price(),
        });
    }
}
