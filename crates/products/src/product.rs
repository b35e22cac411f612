use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, MinorUnits, ProductId};

/// A product held in the warehouse.
///
/// `quantity` is the on-hand stock count. It is unsigned, so a negative
/// balance is unrepresentable; decrements go through the ledger's atomic
/// reservation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Price in the smallest currency unit (e.g. cents).
    pub price: MinorUnits,
    pub quantity: u64,
}

impl Product {
    /// Apply a partial update. Fields absent from the patch are untouched.
    pub fn apply_patch(&mut self, patch: &ProductPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
    }
}

/// Validated input for creating a product. The ledger assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: MinorUnits,
    pub quantity: u64,
}

impl NewProduct {
    /// Validate raw (possibly negative) client input.
    ///
    /// `price`/`quantity` arrive as signed integers from JSON so that a
    /// negative value yields a domain validation error rather than a
    /// deserialization failure.
    pub fn new(
        name: String,
        description: Option<String>,
        price: i64,
        quantity: i64,
    ) -> DomainResult<Self> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        let price = checked_price(price)?;
        let quantity = checked_quantity(quantity)?;
        Ok(Self {
            name,
            description: description.unwrap_or_default(),
            price,
            quantity,
        })
    }
}

/// Partial update: only the fields that are `Some` are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<MinorUnits>,
    pub quantity: Option<u64>,
}

impl ProductPatch {
    pub fn new(
        name: Option<String>,
        description: Option<String>,
        price: Option<i64>,
        quantity: Option<i64>,
    ) -> DomainResult<Self> {
        if let Some(name) = &name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
        }
        let price = price.map(checked_price).transpose()?;
        let quantity = quantity.map(checked_quantity).transpose()?;
        Ok(Self {
            name,
            description,
            price,
            quantity,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
    }
}

fn checked_price(price: i64) -> DomainResult<MinorUnits> {
    u64::try_from(price).map_err(|_| DomainError::validation("price cannot be negative"))
}

fn checked_quantity(quantity: i64) -> DomainResult<u64> {
    u64::try_from(quantity).map_err(|_| DomainError::validation("quantity cannot be negative"))
}
