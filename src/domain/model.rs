use crate::utils::error::{CheckoutError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Flat key/value state owned by one checkout step.
pub type StorageSlice = serde_json::Map<String, serde_json::Value>;

/// Money in minor units (cents) of a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    pub amount: i64,
    pub currency: String,
}

impl Price {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(0, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn checked_add(&self, other: &Price) -> Result<Price> {
        if self.currency != other.currency {
            return Err(CheckoutError::CurrencyMismatch {
                expected: self.currency.clone(),
                found: other.currency.clone(),
            });
        }
        self.amount
            .checked_add(other.amount)
            .map(|amount| Price::new(amount, self.currency.clone()))
            .ok_or_else(|| CheckoutError::PriceOverflow {
                currency: self.currency.clone(),
            })
    }

    pub fn times(&self, quantity: u32) -> Result<Price> {
        self.amount
            .checked_mul(i64::from(quantity))
            .map(|amount| Price::new(amount, self.currency.clone()))
            .ok_or_else(|| CheckoutError::PriceOverflow {
                currency: self.currency.clone(),
            })
    }

    /// Rounds the discount down, so the customer never pays less than the exact result.
    pub fn discounted(&self, percent: u8) -> Price {
        let amount = i128::from(self.amount);
        let discount = amount * i128::from(percent.min(100)) / 100;
        // |discount| <= |amount|, so the difference always fits back into i64.
        Price::new((amount - discount) as i64, self.currency.clone())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        write!(f, "{}{}.{:02} {}", sign, abs / 100, abs % 100, self.currency)
    }
}

/// Options threaded through group pricing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricingOptions {
    pub discount_percent: Option<u8>,
}

impl PricingOptions {
    pub fn with_discount(percent: u8) -> Self {
        Self {
            discount_percent: Some(percent),
        }
    }

    fn apply(&self, price: Price) -> Price {
        match self.discount_percent {
            Some(percent) => price.discounted(percent),
            None => price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryKind {
    Physical,
    Digital,
}

impl fmt::Display for DeliveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryKind::Physical => write!(f, "physical"),
            DeliveryKind::Digital => write!(f, "digital"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub delivery: DeliveryKind,
}

impl LineItem {
    pub fn total(&self) -> Result<Price> {
        self.unit_price.times(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryMethod {
    pub name: String,
    pub price: Price,
}

impl DeliveryMethod {
    pub fn digital(currency: impl Into<String>) -> Self {
        Self {
            name: "digital".to_string(),
            price: Price::zero(currency),
        }
    }
}

/// Cart lines sharing one way of being delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryGroup {
    pub kind: DeliveryKind,
    pub items: Vec<LineItem>,
    pub currency: String,
    pub delivery_method: Option<DeliveryMethod>,
}

impl DeliveryGroup {
    pub fn new(kind: DeliveryKind, items: Vec<LineItem>, currency: impl Into<String>) -> Self {
        Self {
            kind,
            items,
            currency: currency.into(),
            delivery_method: None,
        }
    }

    pub fn is_digital(&self) -> bool {
        self.kind == DeliveryKind::Digital
    }

    pub fn subtotal(&self, options: &PricingOptions) -> Result<Price> {
        self.items
            .iter()
            .try_fold(Price::zero(self.currency.clone()), |acc, item| {
                acc.checked_add(&options.apply(item.total()?))
            })
    }

    pub fn delivery_price(&self) -> Price {
        self.delivery_method
            .as_ref()
            .map(|method| method.price.clone())
            .unwrap_or_else(|| Price::zero(self.currency.clone()))
    }

    pub fn get_total_with_delivery(&self, options: &PricingOptions) -> Result<Price> {
        self.subtotal(options)?.checked_add(&self.delivery_price())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub street_address_1: String,
    pub street_address_2: String,
    pub city: String,
    pub city_area: String,
    pub postal_code: String,
    pub country: String,
    pub country_area: String,
    pub phone: String,
}

impl Address {
    pub const FIELDS: [&'static str; 11] = [
        "first_name",
        "last_name",
        "company_name",
        "street_address_1",
        "street_address_2",
        "city",
        "city_area",
        "postal_code",
        "country",
        "country_area",
        "phone",
    ];

    /// Missing or non-string fields come back empty.
    pub fn from_data(data: &StorageSlice) -> Self {
        let field = |name: &str| {
            data.get(name)
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Self {
            first_name: field("first_name"),
            last_name: field("last_name"),
            company_name: field("company_name"),
            street_address_1: field("street_address_1"),
            street_address_2: field("street_address_2"),
            city: field("city"),
            city_area: field("city_area"),
            postal_code: field("postal_code"),
            country: field("country"),
            country_area: field("country_area"),
            phone: field("phone"),
        }
    }

    pub fn as_data(&self) -> StorageSlice {
        let values = [
            &self.first_name,
            &self.last_name,
            &self.company_name,
            &self.street_address_1,
            &self.street_address_2,
            &self.city,
            &self.city_area,
            &self.postal_code,
            &self.country,
            &self.country_area,
            &self.phone,
        ];
        Self::FIELDS
            .iter()
            .zip(values)
            .map(|(name, value)| (name.to_string(), serde_json::Value::String(value.clone())))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        *self == Address::default()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {}, {} {}, {}",
            self.first_name,
            self.last_name,
            self.street_address_1,
            self.postal_code,
            self.city,
            self.country
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedDeliveryGroup {
    pub kind: DeliveryKind,
    pub items: Vec<LineItem>,
    pub shipping_address: Option<Address>,
    pub delivery_email: Option<String>,
    pub method_name: String,
    pub delivery_price: Price,
}

impl OrderedDeliveryGroup {
    pub fn total(&self) -> Result<Price> {
        self.items
            .iter()
            .try_fold(self.delivery_price.clone(), |acc, item| {
                acc.checked_add(&item.total()?)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<Uuid>,
    pub user: Option<User>,
    pub anonymous_user_email: String,
    pub billing_address: Option<Address>,
    pub groups: Vec<OrderedDeliveryGroup>,
    pub customer_note: String,
    pub tracking_client_id: String,
    pub currency: String,
    pub created: DateTime<Utc>,
}

impl Order {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            id: None,
            user: None,
            anonymous_user_email: String::new(),
            billing_address: None,
            groups: Vec::new(),
            customer_note: String::new(),
            tracking_client_id: String::new(),
            currency: currency.into(),
            created: Utc::now(),
        }
    }

    pub fn total(&self) -> Result<Price> {
        self.groups
            .iter()
            .try_fold(Price::zero(self.currency.clone()), |acc, group| {
                acc.checked_add(&group.total()?)
            })
    }
}
