use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, MinorUnits, OrderId, ProductId, money};

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown status '{other}', expected one of: pending, completed, cancelled"
            ))),
        }
    }
}

/// One requested line of a not-yet-assembled order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u64,
}

/// One line of a persisted order.
///
/// `unit_price` is the product's price captured at assembly time; later
/// catalog price changes never rewrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: MinorUnits,
}

/// A persisted order. Immutable after creation except for `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    /// Derived: exact sum of `unit_price * quantity` over `lines`.
    pub total: MinorUnits,
    pub created_at: DateTime<Utc>,
    /// Line items in request order.
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Build a pending order from snapshot lines, deriving the total.
    ///
    /// The total is computed here and nowhere else; clients never supply it.
    pub fn assemble(lines: Vec<OrderLine>, created_at: DateTime<Utc>) -> DomainResult<Self> {
        let total = money::sum_totals(
            lines
                .iter()
                .map(|l| money::line_total(l.unit_price, l.quantity))
                .collect::<DomainResult<Vec<_>>>()?,
        )?;
        Ok(Self {
            id: OrderId::new(),
            status: OrderStatus::Pending,
            total,
            created_at,
            lines,
        })
    }
}
