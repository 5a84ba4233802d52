use crate::domain::model::{DeliveryKind, LineItem, Price};
use serde::{Deserialize, Serialize};

/// The raw cart as it lives in the session between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCart {
    #[serde(default)]
    pub lines: Vec<LineItem>,
}

impl SessionCart {
    pub fn add_line(&mut self, line: LineItem) {
        self.lines.push(line);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<LineItem>,
    currency: String,
}

impl Cart {
    /// Duplicate skus are merged into the first occurrence and empty lines dropped.
    /// Merged quantities saturate at `u32::MAX`; pricing an oversized line reports
    /// `PriceOverflow`.
    pub fn for_session_cart(session_cart: &SessionCart, currency: impl Into<String>) -> Self {
        let mut lines: Vec<LineItem> = Vec::new();
        for line in session_cart.lines.iter().filter(|line| line.quantity > 0) {
            match lines.iter_mut().find(|existing| existing.sku == line.sku) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity)
                }
                None => lines.push(line.clone()),
            }
        }
        Self {
            lines,
            currency: currency.into(),
        }
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |count, line| count.saturating_add(line.quantity))
    }

    pub fn add_line(
        &mut self,
        sku: &str,
        name: &str,
        quantity: u32,
        unit_price: Price,
        delivery: DeliveryKind,
    ) {
        match self.lines.iter_mut().find(|line| line.sku == sku) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(LineItem {
                sku: sku.to_string(),
                name: name.to_string(),
                quantity,
                unit_price,
                delivery,
            }),
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn to_session_cart(&self) -> SessionCart {
        SessionCart {
            lines: self.lines.clone(),
        }
    }
}
