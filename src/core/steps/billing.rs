use super::{
    address_from_form, stored_address, stored_str, validate_address, CheckoutStep, FormData,
    StepContext, StepKind, StepOutcome,
};
use crate::domain::model::{Order, StorageSlice};
use crate::utils::error::{CheckoutError, Result};
use crate::utils::validation::validate_email;
use serde_json::Value;

pub const BILLING_KEY: &str = "billing";

/// Billing address, plus a contact email when the customer is not logged in.
#[derive(Debug, Clone, Default)]
pub struct BillingStep;

impl BillingStep {
    pub fn new() -> Self {
        Self
    }
}

impl CheckoutStep for BillingStep {
    fn key(&self) -> &str {
        BILLING_KEY
    }

    fn kind(&self) -> StepKind {
        StepKind::Billing
    }

    fn validate(&self, slice: &StorageSlice, ctx: &StepContext) -> Result<()> {
        let address = stored_address(slice)
            .ok_or_else(|| CheckoutError::validation("address", "Enter a billing address"))?;
        validate_address(&address)?;
        if !ctx.authenticated {
            validate_email(
                "email",
                stored_str(slice, "anonymous_user_email").unwrap_or_default(),
            )?;
        }
        Ok(())
    }

    fn process(
        &self,
        slice: &mut StorageSlice,
        form: &FormData,
        ctx: &StepContext,
    ) -> Result<StepOutcome> {
        let address = address_from_form(form)
            .ok_or_else(|| CheckoutError::validation("address", "Enter a billing address"))?;
        validate_address(&address)?;

        let email = if ctx.authenticated {
            None
        } else {
            let email = form.get("email").map(|e| e.trim()).unwrap_or_default();
            validate_email("email", email)?;
            Some(email.to_string())
        };

        slice.insert("address".to_string(), Value::Object(address.as_data()));
        if let Some(email) = email {
            slice.insert("anonymous_user_email".to_string(), Value::String(email));
        }
        Ok(StepOutcome::Advance)
    }

    fn add_to_order(&self, slice: &StorageSlice, order: &mut Order) {
        order.billing_address = stored_address(slice).filter(|address| !address.is_empty());
        order.anonymous_user_email = stored_str(slice, "anonymous_user_email")
            .unwrap_or_default()
            .to_string();
    }
}
