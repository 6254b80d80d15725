use serde::{Deserialize, Serialize};

use pantry_core::{DomainError, DomainResult, Entity, ValueObject};

use crate::key::ItemKey;

/// Units on hand for one item. Between one and [`Quantity::MAX`].
///
/// The upper bound is `i64::MAX` so every value fits a signed 64-bit counter
/// in the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Quantity(u64);

impl Quantity {
    /// Quantity of a freshly created record.
    pub const ONE: Quantity = Quantity(1);

    pub const MAX: Quantity = Quantity(i64::MAX as u64);

    pub fn new(value: u64) -> DomainResult<Self> {
        if value == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if value > Self::MAX.0 {
            return Err(DomainError::validation(format!(
                "quantity must be at most {}",
                Self::MAX.0
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn incremented(self) -> DomainResult<Self> {
        if self == Self::MAX {
            return Err(DomainError::invariant("quantity overflow"));
        }
        Ok(Self(self.0 + 1))
    }

    /// `None` when the last unit is taken away.
    pub fn decremented(self) -> Option<Self> {
        match self.0 {
            1 => None,
            n => Some(Self(n - 1)),
        }
    }
}

impl ValueObject for Quantity {}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<u64> for Quantity {
    type Error = DomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

/// One key/quantity pair persisted in the store.
///
/// There is no zero-quantity record: an item with no units has no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRecord {
    key: ItemKey,
    quantity: Quantity,
}

impl InventoryRecord {
    pub fn new(key: ItemKey, quantity: Quantity) -> Self {
        Self { key, quantity }
    }

    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }
}

impl Entity for InventoryRecord {
    type Id = ItemKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }
}
