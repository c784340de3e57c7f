// src/defaults.rs
//! Canonical catalog rows written into an empty services or discounts file.
use crate::codec::Record;
use crate::error::StoreResult;
use crate::models::{Discount, ServiceItem};
use crate::store::RecordStore;
use log;

/// Record kinds that ship with a baseline catalog.
pub trait DefaultCatalog: Record {
    /// The rows to seed, ids starting at 1 and strictly increasing.
    fn defaults() -> Vec<Self>;
}

impl DefaultCatalog for ServiceItem {
    fn defaults() -> Vec<Self> {
        [
            (1, "Oil Change", 1200.0),
            (2, "Brake Inspection", 800.0),
            (3, "Wheel Alignment", 600.0),
            (4, "Car Wash", 500.0),
            (5, "Engine Tune-up", 2000.0),
            (6, "General Service", 1500.0),
        ]
        .into_iter()
        .map(|(id, name, price)| ServiceItem { id, name: name.to_string(), price })
        .collect()
    }
}

impl DefaultCatalog for Discount {
    fn defaults() -> Vec<Self> {
        [
            (1, "New Year Offer", 10.0, "New Year 10% off"),
            (2, "Diwali Special", 15.0, "Festival offer"),
            (3, "Summer Sale", 5.0, "Flat 5% summer discount"),
        ]
        .into_iter()
        .map(|(id, name, percent, note)| Discount {
            id,
            name: name.to_string(),
            percent,
            note: note.to_string(),
        })
        .collect()
    }
}

impl<R: DefaultCatalog> RecordStore<R> {
    /// Seeds the default catalog if the store has no loadable records.
    ///
    /// Returns `true` if rows were written. A non-empty store is left untouched,
    /// so repeated calls never duplicate rows.
    pub fn ensure_defaults(&self) -> StoreResult<bool> {
        let mut records = self.load_all()?;
        if !records.is_empty() {
            return Ok(false);
        }
        records.extend(R::defaults());
        log::info!("Seeding {} default {} record(s) into {:?}", records.len(), R::KIND, self.path());
        self.save_all(&records)?;
        Ok(true)
    }
}
