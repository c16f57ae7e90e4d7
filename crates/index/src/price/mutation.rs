//! Arguments of a price add or removal

use tessera_core::{
    DateTimeRange, InternalPriceId, PriceIndexKey, PriceInnerRecordHandling, PriceKey, PrimaryKey,
};

/// One price as handed to `add_price` / `remove_price`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceMutation {
    /// Entity owning the price
    pub entity_primary_key: PrimaryKey,
    /// Internal id; drawn from the sequence when a super index adds without one
    pub internal_price_id: Option<InternalPriceId>,
    /// Business identity of the price
    pub price_key: PriceKey,
    /// Inner record handling of the owning entity
    pub record_handling: PriceInnerRecordHandling,
    /// Inner record the price is specific to
    pub inner_record_id: Option<u32>,
    /// Validity, unbounded when absent
    pub validity: Option<DateTimeRange>,
    /// Fixed-point price excluding tax
    pub price_without_tax: i32,
    /// Fixed-point price including tax
    pub price_with_tax: i32,
}

impl PriceMutation {
    /// Price without internal id, inner record or validity
    pub fn new(
        entity_primary_key: PrimaryKey,
        price_key: PriceKey,
        record_handling: PriceInnerRecordHandling,
        price_without_tax: i32,
        price_with_tax: i32,
    ) -> Self {
        Self {
            entity_primary_key,
            internal_price_id: None,
            price_key,
            record_handling,
            inner_record_id: None,
            validity: None,
            price_without_tax,
            price_with_tax,
        }
    }

    /// Set the internal price id
    pub fn with_internal_price_id(mut self, internal_price_id: InternalPriceId) -> Self {
        self.internal_price_id = Some(internal_price_id);
        self
    }

    /// Bind the price to an inner record
    pub fn with_inner_record(mut self, inner_record_id: u32) -> Self {
        self.inner_record_id = Some(inner_record_id);
        self
    }

    /// Limit the validity
    pub fn with_validity(mut self, validity: DateTimeRange) -> Self {
        self.validity = Some(validity);
        self
    }

    /// Bucket the price belongs to
    pub fn index_key(&self) -> PriceIndexKey {
        PriceIndexKey::from_price_key(&self.price_key, self.record_handling)
    }

    /// Validity, unbounded when absent
    pub fn effective_validity(&self) -> DateTimeRange {
        self.validity.unwrap_or_default()
    }
}
