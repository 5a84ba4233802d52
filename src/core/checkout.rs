use crate::core::steps::{
    billing::BILLING_KEY, summary::SUMMARY_KEY, BillingStep, CheckoutStep, DigitalDeliveryStep,
    FormData, ShippingStep, StepContext, StepOutcome, SummaryStep,
};
use crate::core::storage::CheckoutStorage;
use crate::domain::cart::Cart;
use crate::domain::model::{
    Address, DeliveryMethod, Order, Price, PricingOptions, StorageSlice,
};
use crate::domain::ports::{Analytics, OrderRepository, Partitioner};
use crate::domain::request::RequestContext;
use crate::utils::error::{CheckoutError, Result};
use serde_json::Value;
use std::sync::OnceLock;

/// Session slot holding the serialized checkout storage.
pub const STORAGE_SESSION_KEY: &str = "checkout_storage";

/// Shop-wide settings the checkout prices and ships with.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSettings {
    pub default_currency: String,
    pub shipping_methods: Vec<DeliveryMethod>,
}

impl CheckoutSettings {
    pub fn new(default_currency: impl Into<String>) -> Self {
        Self {
            default_currency: default_currency.into(),
            shipping_methods: Vec::new(),
        }
    }

    pub fn with_shipping_method(mut self, name: &str, amount: i64) -> Self {
        let price = Price::new(amount, self.default_currency.clone());
        self.shipping_methods.push(DeliveryMethod {
            name: name.to_string(),
            price,
        });
        self
    }
}

fn empty_slice() -> &'static StorageSlice {
    static EMPTY: OnceLock<StorageSlice> = OnceLock::new();
    EMPTY.get_or_init(StorageSlice::new)
}

fn is_delivery_key(key: &str) -> bool {
    ["shipping_", "digital_"]
        .iter()
        .any(|prefix| key.starts_with(prefix))
}

/// The checkout wizard for one request.
///
/// Steps are rebuilt from the cart every time the manager is constructed:
/// billing first, one delivery step per delivery group, summary last. Nothing
/// is written back to the session until [`Checkout::save`] is called.
pub struct Checkout<'a> {
    request: &'a mut RequestContext,
    settings: &'a CheckoutSettings,
    partitioner: &'a dyn Partitioner,
    storage: CheckoutStorage,
    cart: Cart,
    steps: Vec<Box<dyn CheckoutStep>>,
}

impl<'a> Checkout<'a> {
    pub fn new(
        request: &'a mut RequestContext,
        settings: &'a CheckoutSettings,
        partitioner: &'a dyn Partitioner,
    ) -> Self {
        let storage = match request.session.get(STORAGE_SESSION_KEY) {
            Some(Value::Object(plain)) => CheckoutStorage::from_plain_mapping(plain),
            Some(other) => {
                tracing::warn!("Discarding malformed checkout storage in session: {}", other);
                CheckoutStorage::new()
            }
            None => {
                tracing::debug!("No checkout storage in session, starting fresh");
                CheckoutStorage::new()
            }
        };
        let cart = Cart::for_session_cart(&request.cart, settings.default_currency.clone());

        let mut checkout = Self {
            request,
            settings,
            partitioner,
            storage,
            cart: cart.clone(),
            steps: Vec::new(),
        };
        checkout.generate_steps(cart);
        checkout
    }

    /// Replaces the step list with one built from `cart`.
    ///
    /// Delivery step keys use the group's position among all groups, so digital
    /// and physical steps share one index sequence.
    pub fn generate_steps(&mut self, cart: Cart) {
        let groups = self.partitioner.partition(&cart);
        let mut steps: Vec<Box<dyn CheckoutStep>> = Vec::with_capacity(groups.len() + 2);

        self.storage.get(BILLING_KEY);
        steps.push(Box::new(BillingStep::new()));

        let billing_address = self.billing_address();
        let default_email = self
            .request
            .user
            .as_ref()
            .map(|user| user.email.clone())
            .or_else(|| self.anonymous_user_email())
            .filter(|email| !email.is_empty());

        for (index, group) in groups.into_iter().enumerate() {
            if group.is_digital() {
                self.storage.get(&DigitalDeliveryStep::storage_key(index));
                steps.push(Box::new(DigitalDeliveryStep::new(
                    index,
                    group,
                    default_email.clone(),
                )));
            } else {
                let slice = self.storage.get(&ShippingStep::storage_key(index));
                steps.push(Box::new(ShippingStep::new(
                    index,
                    group,
                    slice,
                    self.settings.shipping_methods.clone(),
                    billing_address.clone(),
                )));
            }
        }

        self.storage.get(SUMMARY_KEY);
        steps.push(Box::new(SummaryStep::new()));

        // Delivery slices of groups the cart no longer produces.
        let pruned = self.storage.retain(|key| {
            !is_delivery_key(key) || steps.iter().any(|step| step.key() == key)
        });
        if pruned > 0 {
            tracing::debug!("Dropped {} stale delivery slices", pruned);
        }

        tracing::debug!(
            "Generated {} checkout steps: {}",
            steps.len(),
            steps
                .iter()
                .map(|step| step.key())
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.steps = steps;
        self.cart = cart;
    }

    pub fn request(&self) -> &RequestContext {
        &*self.request
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn storage(&self) -> &CheckoutStorage {
        &self.storage
    }

    pub fn steps(&self) -> &[Box<dyn CheckoutStep>] {
        &self.steps
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn CheckoutStep + 'static)> {
        self.steps.iter().map(|step| step.as_ref())
    }

    pub fn step(&self, key: &str) -> Option<&dyn CheckoutStep> {
        self.iter().find(|step| step.key() == key)
    }

    /// The stored state of the step with `key`; empty if nothing is stored.
    pub fn step_storage(&self, key: &str) -> &StorageSlice {
        self.storage.peek(key).unwrap_or(empty_slice())
    }

    pub fn billing_address(&self) -> Address {
        match self.step_storage(BILLING_KEY).get("address") {
            Some(Value::Object(data)) => Address::from_data(data),
            _ => Address::default(),
        }
    }

    pub fn set_billing_address(&mut self, address: &Address) {
        self.storage
            .get(BILLING_KEY)
            .insert("address".to_string(), Value::Object(address.as_data()));
        self.storage.mark_modified();
    }

    pub fn delete_billing_address(&mut self) {
        self.storage
            .get(BILLING_KEY)
            .insert("address".to_string(), Value::Null);
        self.storage.mark_modified();
    }

    pub fn anonymous_user_email(&self) -> Option<String> {
        self.step_storage(BILLING_KEY)
            .get("anonymous_user_email")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn set_anonymous_user_email(&mut self, email: &str) {
        self.storage.get(BILLING_KEY).insert(
            "anonymous_user_email".to_string(),
            Value::String(email.to_string()),
        );
        self.storage.mark_modified();
    }

    pub fn delete_anonymous_user_email(&mut self) {
        self.set_anonymous_user_email("");
    }

    /// Sum of every delivery group's total including delivery, in the default currency.
    pub fn get_total(&self, options: &PricingOptions) -> Result<Price> {
        self.iter()
            .filter_map(|step| step.group())
            .try_fold(
                Price::zero(self.settings.default_currency.clone()),
                |total, group| total.checked_add(&group.get_total_with_delivery(options)?),
            )
    }

    pub fn delivery_steps(&self) -> Vec<&dyn CheckoutStep> {
        self.iter().filter(|step| step.group().is_some()).collect()
    }

    fn context(&self, options: &PricingOptions) -> Result<StepContext> {
        Ok(StepContext {
            authenticated: self.request.is_authenticated(),
            user_email: self.request.user.as_ref().map(|user| user.email.clone()),
            billing_address: self.billing_address(),
            anonymous_user_email: self.anonymous_user_email(),
            total: self.get_total(options)?,
        })
    }

    /// First step whose stored data does not validate; `None` once everything does.
    pub fn next_step(&self, options: &PricingOptions) -> Result<Option<&dyn CheckoutStep>> {
        let ctx = self.context(options)?;
        Ok(self
            .iter()
            .find(|step| step.validate(self.step_storage(step.key()), &ctx).is_err()))
    }

    pub fn is_complete(&self, options: &PricingOptions) -> Result<bool> {
        Ok(self.next_step(options)?.is_none())
    }

    /// Runs one step's form against its slice and rebuilds the steps so the new
    /// data (e.g. a chosen shipping method) is reflected. Does not save.
    pub fn submit(
        &mut self,
        key: &str,
        form: &FormData,
        options: &PricingOptions,
    ) -> Result<StepOutcome> {
        let ctx = self.context(options)?;
        let step = self
            .steps
            .iter()
            .find(|step| step.key() == key)
            .ok_or_else(|| CheckoutError::UnknownStep {
                key: key.to_string(),
            })?;

        let outcome = step.process(self.storage.get(key), form, &ctx)?;
        self.storage.mark_modified();
        tracing::debug!("Step '{}' accepted ({} step)", key, step.kind());

        self.generate_steps(self.cart.clone());
        Ok(outcome)
    }

    pub fn save(&mut self) {
        self.request.session.insert(
            STORAGE_SESSION_KEY,
            Value::Object(self.storage.as_plain_mapping()),
        );
        self.storage.mark_saved();
    }

    /// Drops the stored checkout and empties the cart. Only meant to follow a
    /// successfully created order.
    pub fn clear_storage(&mut self) {
        self.request.session.remove(STORAGE_SESSION_KEY);
        self.request.cart.clear();
        self.cart.clear();
        tracing::info!("Checkout storage and cart cleared");
    }

    /// Builds the order from every step in order and persists it. Does not save
    /// or clear the checkout storage.
    pub async fn create_order<R, A>(&self, orders: &R, analytics: &A) -> Result<Order>
    where
        R: OrderRepository + ?Sized,
        A: Analytics + ?Sized,
    {
        let mut order = Order::new(self.settings.default_currency.clone());
        let authenticated = self.request.is_authenticated();
        if let Some(user) = &self.request.user {
            order.user = Some(user.clone());
        }

        for step in self.iter() {
            step.add_to_order(self.step_storage(step.key()), &mut order);
        }

        if authenticated {
            order.anonymous_user_email.clear();
        }
        order.tracking_client_id = analytics.get_client_id(self.request());

        let order = orders.save(order).await?;
        tracing::info!(
            "Order {} created with {} delivery group(s)",
            order
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "<unassigned>".to_string()),
            order.groups.len()
        );
        Ok(order)
    }

    /// Creates the order and then clears the checkout, as the summary step does
    /// on confirmation.
    pub async fn place_order<R, A>(&mut self, orders: &R, analytics: &A) -> Result<Order>
    where
        R: OrderRepository + ?Sized,
        A: Analytics + ?Sized,
    {
        let order = self.create_order(orders, analytics).await?;
        self.clear_storage();
        Ok(order)
    }
}

impl<'c, 'a> IntoIterator for &'c Checkout<'a> {
    type Item = &'c Box<dyn CheckoutStep>;
    type IntoIter = std::slice::Iter<'c, Box<dyn CheckoutStep>>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
