use super::{form_flag, stored_str, CheckoutStep, FormData, StepContext, StepKind, StepOutcome};
use crate::domain::model::{Order, Price, StorageSlice};
use crate::utils::error::{CheckoutError, Result};
use serde_json::Value;

pub const SUMMARY_KEY: &str = "summary";

/// Final review. Confirming records the total the customer agreed to; if the
/// checkout total moves afterwards the confirmation no longer counts.
#[derive(Debug, Clone, Default)]
pub struct SummaryStep;

impl SummaryStep {
    pub fn new() -> Self {
        Self
    }

    fn confirmed_total(slice: &StorageSlice) -> Option<Price> {
        slice
            .get("confirmed_total")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
    }
}

impl CheckoutStep for SummaryStep {
    fn key(&self) -> &str {
        SUMMARY_KEY
    }

    fn kind(&self) -> StepKind {
        StepKind::Summary
    }

    fn validate(&self, slice: &StorageSlice, ctx: &StepContext) -> Result<()> {
        match Self::confirmed_total(slice) {
            Some(total) if total == ctx.total => Ok(()),
            Some(_) => Err(CheckoutError::validation(
                "confirm",
                "The order total changed, please review and confirm again",
            )),
            None => Err(CheckoutError::validation("confirm", "Confirm your order")),
        }
    }

    fn process(
        &self,
        slice: &mut StorageSlice,
        form: &FormData,
        ctx: &StepContext,
    ) -> Result<StepOutcome> {
        if !form_flag(form, "confirm") {
            return Err(CheckoutError::validation("confirm", "Confirm your order"));
        }
        let note = form.get("note").map(|note| note.trim()).unwrap_or_default();

        slice.insert("note".to_string(), Value::String(note.to_string()));
        slice.insert("confirmed_total".to_string(), serde_json::to_value(&ctx.total)?);
        Ok(StepOutcome::PlaceOrder)
    }

    fn add_to_order(&self, slice: &StorageSlice, order: &mut Order) {
        order.customer_note = stored_str(slice, "note").unwrap_or_default().to_string();
    }
}
