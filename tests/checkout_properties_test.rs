use checkout_wizard::core::{Cart, Partitioner, PricingOptions, RequestContext, SessionRecord};
use checkout_wizard::domain::cart::SessionCart;
use checkout_wizard::domain::model::{
    Address, DeliveryGroup, DeliveryKind, LineItem, Price, User,
};
use checkout_wizard::{
    Checkout, CheckoutError, CheckoutSettings, CookieAnalytics, DeliveryPartitioner,
    MemoryOrderRepository, StepKind, STORAGE_SESSION_KEY,
};
use serde_json::{json, Value};

/// Returns the same groups for any cart, in the given order.
struct FixedPartitioner(Vec<DeliveryGroup>);

impl Partitioner for FixedPartitioner {
    fn partition(&self, _cart: &Cart) -> Vec<DeliveryGroup> {
        self.0.clone()
    }
}

fn line(sku: &str, amount: i64, delivery: DeliveryKind) -> LineItem {
    LineItem {
        sku: sku.to_string(),
        name: sku.to_string(),
        quantity: 1,
        unit_price: Price::new(amount, "USD"),
        delivery,
    }
}

fn group(sku: &str, amount: i64, kind: DeliveryKind) -> DeliveryGroup {
    DeliveryGroup::new(kind, vec![line(sku, amount, kind)], "USD")
}

fn settings() -> CheckoutSettings {
    CheckoutSettings::new("USD")
        .with_shipping_method("dhl", 1000)
        .with_shipping_method("ups", 1500)
}

fn request_with_cart(lines: Vec<LineItem>) -> RequestContext {
    RequestContext::new(SessionRecord {
        cart: SessionCart { lines },
        ..SessionRecord::default()
    })
}

fn sample_address() -> Address {
    Address {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        company_name: "Analytical Engines".to_string(),
        street_address_1: "12 St James's Square".to_string(),
        street_address_2: "Flat 2".to_string(),
        city: "London".to_string(),
        city_area: "Westminster".to_string(),
        postal_code: "SW1Y 4JH".to_string(),
        country: "GB".to_string(),
        country_area: "".to_string(),
        phone: "+44 20 7946 0000".to_string(),
    }
}

#[test]
fn test_fresh_checkout_has_empty_slices() {
    let settings = settings();
    let partitioner = FixedPartitioner(vec![
        group("ebook", 900, DeliveryKind::Digital),
        group("mug", 2500, DeliveryKind::Physical),
    ]);
    let mut request = RequestContext::default();
    let checkout = Checkout::new(&mut request, &settings, &partitioner);

    assert_eq!(checkout.steps().len(), 4);
    for step in &checkout {
        assert!(
            checkout.step_storage(step.key()).is_empty(),
            "slice {} should be empty",
            step.key()
        );
        assert!(checkout.storage().contains_key(step.key()));
    }
}

#[test]
fn test_empty_cart_has_billing_and_summary_only() {
    let settings = settings();
    let partitioner = FixedPartitioner(Vec::new());
    let mut request = RequestContext::default();
    let checkout = Checkout::new(&mut request, &settings, &partitioner);

    let kinds: Vec<StepKind> = checkout.iter().map(|step| step.kind()).collect();
    assert_eq!(kinds, vec![StepKind::Billing, StepKind::Summary]);
    assert!(checkout.delivery_steps().is_empty());
}

#[test]
fn test_delivery_step_keys_share_one_index_sequence() {
    let settings = settings();
    let partitioner = FixedPartitioner(vec![
        group("ebook", 900, DeliveryKind::Digital),
        group("mug", 2500, DeliveryKind::Physical),
        group("song", 100, DeliveryKind::Digital),
    ]);
    let mut request = RequestContext::default();
    let checkout = Checkout::new(&mut request, &settings, &partitioner);

    let keys: Vec<&str> = checkout.iter().map(|step| step.key()).collect();
    assert_eq!(
        keys,
        vec!["billing", "digital_0", "shipping_1", "digital_2", "summary"]
    );

    let kinds: Vec<StepKind> = checkout.iter().map(|step| step.kind()).collect();
    assert_eq!(
        kinds.iter().filter(|kind| **kind == StepKind::Shipping).count(),
        1
    );
    assert_eq!(
        kinds
            .iter()
            .filter(|kind| **kind == StepKind::DigitalDelivery)
            .count(),
        2
    );

    let delivery_keys: Vec<&str> = checkout
        .delivery_steps()
        .into_iter()
        .map(|step| step.key())
        .collect();
    assert_eq!(delivery_keys, vec!["digital_0", "shipping_1", "digital_2"]);
}

#[test]
fn test_billing_address_survives_save_and_reload() {
    let settings = settings();
    let partitioner = FixedPartitioner(Vec::new());
    let mut request = RequestContext::default();

    {
        let mut checkout = Checkout::new(&mut request, &settings, &partitioner);
        checkout.set_billing_address(&sample_address());
        checkout.save();
    }

    let mut reloaded = RequestContext::new(request.to_record());
    let checkout = Checkout::new(&mut reloaded, &settings, &partitioner);
    let address = checkout.billing_address();
    assert_eq!(address.as_data(), sample_address().as_data());
    assert_eq!(address, sample_address());
}

#[test]
fn test_unsaved_changes_are_not_persisted() {
    let settings = settings();
    let partitioner = FixedPartitioner(Vec::new());
    let mut request = RequestContext::default();

    {
        let mut checkout = Checkout::new(&mut request, &settings, &partitioner);
        checkout.set_anonymous_user_email("guest@example.com");
        assert!(checkout.storage().is_modified());
    }

    assert!(!request.session.contains_key(STORAGE_SESSION_KEY));
    let checkout = Checkout::new(&mut request, &settings, &partitioner);
    assert_eq!(checkout.anonymous_user_email(), None);
}

#[test]
fn test_total_sums_delivery_groups_including_delivery() {
    let settings = settings();
    let partitioner = FixedPartitioner(vec![
        group("mug", 2500, DeliveryKind::Physical),
        group("lamp", 4000, DeliveryKind::Physical),
    ]);
    let mut request = RequestContext::default();
    request.session.insert(
        STORAGE_SESSION_KEY,
        json!({
            "shipping_0": {"method": "dhl"},
            "shipping_1": {"method": "ups"},
        }),
    );
    let checkout = Checkout::new(&mut request, &settings, &partitioner);

    let options = PricingOptions::default();
    let groups: Vec<&DeliveryGroup> = checkout
        .delivery_steps()
        .into_iter()
        .filter_map(|step| step.group())
        .collect();
    let p1 = groups[0].get_total_with_delivery(&options).unwrap();
    let p2 = groups[1].get_total_with_delivery(&options).unwrap();
    assert_eq!(p1, Price::new(3500, "USD"));
    assert_eq!(p2, Price::new(5500, "USD"));
    assert_eq!(
        checkout.get_total(&options).unwrap(),
        p1.checked_add(&p2).unwrap()
    );
}

#[test]
fn test_total_without_delivery_groups_is_zero_in_default_currency() {
    let settings = CheckoutSettings::new("EUR");
    let partitioner = FixedPartitioner(Vec::new());
    let mut request = RequestContext::default();
    let checkout = Checkout::new(&mut request, &settings, &partitioner);

    assert_eq!(
        checkout.get_total(&PricingOptions::default()).unwrap(),
        Price::zero("EUR")
    );
}

#[tokio::test]
async fn test_authenticated_order_never_carries_anonymous_email() {
    let settings = settings();
    let partitioner = FixedPartitioner(Vec::new());
    let mut request = RequestContext::default().with_user(User {
        id: 7,
        email: "member@example.com".to_string(),
    });
    request.session.insert(
        STORAGE_SESSION_KEY,
        json!({"billing": {"anonymous_user_email": "stale@example.com"}}),
    );

    let checkout = Checkout::new(&mut request, &settings, &partitioner);
    assert_eq!(
        checkout.anonymous_user_email().as_deref(),
        Some("stale@example.com")
    );

    let orders = MemoryOrderRepository::new();
    let order = checkout
        .create_order(&orders, &CookieAnalytics)
        .await
        .unwrap();

    assert_eq!(order.anonymous_user_email, "");
    assert_eq!(order.user.as_ref().unwrap().id, 7);
    assert!(!order.tracking_client_id.is_empty());
    assert_eq!(orders.all().await.len(), 1);
}

#[tokio::test]
async fn test_anonymous_order_keeps_email() {
    let settings = settings();
    let partitioner = FixedPartitioner(Vec::new());
    let mut request = RequestContext::default();
    request.session.insert(
        STORAGE_SESSION_KEY,
        json!({"billing": {"anonymous_user_email": "guest@example.com"}}),
    );

    let checkout = Checkout::new(&mut request, &settings, &partitioner);
    let order = checkout
        .create_order(&MemoryOrderRepository::new(), &CookieAnalytics)
        .await
        .unwrap();

    assert!(order.user.is_none());
    assert_eq!(order.anonymous_user_email, "guest@example.com");
}

#[tokio::test]
async fn test_clear_storage_after_order_starts_fresh() {
    let settings = settings();
    let partitioner = FixedPartitioner(Vec::new());
    let mut request = request_with_cart(vec![line("mug", 2500, DeliveryKind::Physical)]);

    {
        let mut checkout = Checkout::new(&mut request, &settings, &partitioner);
        checkout.set_billing_address(&sample_address());
        checkout.save();
        assert!(!checkout.cart().is_empty());

        checkout
            .create_order(&MemoryOrderRepository::new(), &CookieAnalytics)
            .await
            .unwrap();
        assert!(checkout.request().session.contains_key(STORAGE_SESSION_KEY));

        checkout.clear_storage();
        assert!(checkout.cart().is_empty());
    }

    assert!(!request.session.contains_key(STORAGE_SESSION_KEY));
    assert!(request.cart.is_empty());

    let mut next_request = RequestContext::new(request.to_record());
    let checkout = Checkout::new(&mut next_request, &settings, &partitioner);
    assert!(checkout.cart().is_empty());
    assert!(checkout.billing_address().is_empty());
    for step in &checkout {
        assert!(checkout.step_storage(step.key()).is_empty());
    }
}

#[test]
fn test_delete_resets_to_empty_marker() {
    let settings = settings();
    let partitioner = FixedPartitioner(Vec::new());
    let mut request = RequestContext::default();
    let mut checkout = Checkout::new(&mut request, &settings, &partitioner);

    checkout.set_billing_address(&sample_address());
    checkout.set_anonymous_user_email("guest@example.com");

    checkout.delete_billing_address();
    checkout.delete_anonymous_user_email();

    let billing = checkout.step_storage("billing");
    assert_eq!(billing.get("address"), Some(&Value::Null));
    assert_eq!(
        billing.get("anonymous_user_email"),
        Some(&Value::String(String::new()))
    );
    assert_eq!(checkout.billing_address(), Address::default());
    assert_eq!(checkout.anonymous_user_email().as_deref(), Some(""));
}

#[test]
fn test_malformed_session_storage_starts_fresh() {
    let settings = settings();
    let partitioner = FixedPartitioner(Vec::new());
    let mut request = RequestContext::default();
    request
        .session
        .insert(STORAGE_SESSION_KEY, json!("not a mapping"));

    let checkout = Checkout::new(&mut request, &settings, &partitioner);
    assert!(checkout.step_storage("billing").is_empty());
    assert_eq!(checkout.billing_address(), Address::default());
}

#[tokio::test]
async fn test_order_from_fresh_storage_with_every_step_kind() {
    let settings = settings();
    let partitioner = FixedPartitioner(vec![
        group("mug", 2500, DeliveryKind::Physical),
        group("ebook", 900, DeliveryKind::Digital),
    ]);
    let mut request = RequestContext::default();
    let checkout = Checkout::new(&mut request, &settings, &partitioner);

    let kinds: Vec<StepKind> = checkout.iter().map(|step| step.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            StepKind::Billing,
            StepKind::Shipping,
            StepKind::DigitalDelivery,
            StepKind::Summary
        ]
    );

    let order = checkout
        .create_order(&MemoryOrderRepository::new(), &CookieAnalytics)
        .await
        .unwrap();

    assert!(order.billing_address.is_none());
    assert_eq!(order.anonymous_user_email, "");
    assert_eq!(order.customer_note, "");
    assert_eq!(order.groups.len(), 2);

    let shipping = &order.groups[0];
    assert!(shipping.shipping_address.is_none());
    assert!(shipping.delivery_email.is_none());
    assert_eq!(shipping.method_name, "");

    let digital = &order.groups[1];
    assert!(digital.shipping_address.is_none());
    assert!(digital.delivery_email.is_none());
    assert_eq!(order.total().unwrap(), Price::new(3400, "USD"));
}

#[test]
fn test_oversized_cart_reports_price_overflow() {
    let settings = settings();
    let mut huge = line("gold", 5_000_000_000, DeliveryKind::Physical);
    huge.quantity = 3_000_000_000;
    let mut request = request_with_cart(vec![huge.clone(), huge]);

    let checkout = Checkout::new(&mut request, &settings, &DeliveryPartitioner);
    assert_eq!(checkout.cart().lines()[0].quantity, u32::MAX);
    assert!(matches!(
        checkout.get_total(&PricingOptions::default()),
        Err(CheckoutError::PriceOverflow { .. })
    ));
    assert!(matches!(
        checkout.next_step(&PricingOptions::default()),
        Err(CheckoutError::PriceOverflow { .. })
    ));
}

#[test]
fn test_stale_delivery_slices_are_dropped() {
    let settings = settings();
    let partitioner = FixedPartitioner(vec![group("mug", 2500, DeliveryKind::Physical)]);
    let mut request = RequestContext::default();
    request.session.insert(
        STORAGE_SESSION_KEY,
        json!({
            "billing": {"anonymous_user_email": "guest@example.com"},
            "shipping_0": {"method": "dhl"},
            "digital_1": {"email": "old@example.com"},
            "shipping_2": {"method": "ups"},
        }),
    );

    let mut checkout = Checkout::new(&mut request, &settings, &partitioner);
    let mut keys: Vec<&str> = checkout.storage().keys().collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["billing", "shipping_0", "summary"]);
    assert_eq!(checkout.step_storage("shipping_0")["method"], json!("dhl"));

    checkout.save();
    let saved = checkout.request().session.get(STORAGE_SESSION_KEY).unwrap();
    assert!(saved.get("digital_1").is_none());
    assert!(saved.get("shipping_2").is_none());
}

#[test]
fn test_save_clears_modified_flag() {
    let settings = settings();
    let partitioner = FixedPartitioner(Vec::new());
    let mut request = RequestContext::default();
    let mut checkout = Checkout::new(&mut request, &settings, &partitioner);

    checkout.set_anonymous_user_email("guest@example.com");
    assert!(checkout.storage().is_modified());

    checkout.save();
    assert!(!checkout.storage().is_modified());
    assert_eq!(
        checkout.anonymous_user_email().as_deref(),
        Some("guest@example.com")
    );
}
