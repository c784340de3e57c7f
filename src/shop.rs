// src/shop.rs
//! Shop operations built on the five record stores.
//!
//! Every mutation is a full load, modify, save cycle against one store.
//! Nothing here is atomic across stores.
use crate::config::{Config, DataFiles};
use crate::error::{ShopError, ShopResult};
use crate::models::{
    current_date_time, Customer, Discount, HistoryEntry, HistoryStatus, ServiceItem, Vehicle, NO_DISCOUNT,
};
use crate::store::RecordStore;
use crate::codec::Record;
use log;
use std::path::Path;

/// Field changes for an update. `None`, or an empty string for text fields,
/// keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VehicleUpdate {
    pub customer_id: Option<i64>,
    pub reg_no: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct DiscountUpdate {
    pub name: Option<String>,
    pub percent: Option<f64>,
    pub note: Option<String>,
}

/// A history entry together with the catalog rows its service ids resolve to.
#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    pub entry: HistoryEntry,
    pub lines: Vec<ServiceItem>, // ids no longer in the catalog are omitted
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkout {
    pub completed: usize,
    pub vehicles_removed: usize,
    pub customer_removed: bool,
}

pub struct Shop {
    customers: RecordStore<Customer>,
    vehicles: RecordStore<Vehicle>,
    services: RecordStore<ServiceItem>,
    discounts: RecordStore<Discount>,
    history: RecordStore<HistoryEntry>,
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn replace_text(slot: &mut String, value: Option<String>) {
    replace(slot, value.filter(|text| !text.is_empty()));
}

fn validate_price(price: f64) -> ShopResult<f64> {
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(ShopError::InvalidPrice(price))
    }
}

fn not_found<R: Record>(id: i64) -> ShopError {
    ShopError::NotFound { kind: R::KIND, id }
}

/// Removes the record with `id`. Fails if it was not there.
fn delete_by_id<R: Record>(store: &RecordStore<R>, id: i64) -> ShopResult<()> {
    let mut records = store.load_all()?;
    let before = records.len();
    records.retain(|r| r.id() != id);
    if records.len() == before {
        return Err(not_found::<R>(id));
    }
    store.save_all(&records)?;
    log::info!("Deleted {} {}", R::KIND, id);
    Ok(())
}

/// Applies `edit` to the record with `id`, saves, and returns the edited record.
fn update_by_id<R: Record>(
    store: &RecordStore<R>,
    id: i64,
    edit: impl FnOnce(&mut R) -> ShopResult<()>,
) -> ShopResult<R> {
    let mut records = store.load_all()?;
    let record = records
        .iter_mut()
        .find(|r| r.id() == id)
        .ok_or_else(|| not_found::<R>(id))?;
    edit(record)?;
    let updated = record.clone();
    store.save_all(&records)?;
    log::info!("Updated {} {}", R::KIND, id);
    Ok(updated)
}

/// Appends a record built from the store's next id and saves.
fn append_new<R: Record>(store: &RecordStore<R>, build: impl FnOnce(i64) -> R) -> ShopResult<R> {
    let mut records = store.load_all()?;
    let record = build(store.next_id()?);
    records.push(record.clone());
    store.save_all(&records)?;
    log::info!("Added {} {}", R::KIND, record.id());
    Ok(record)
}

impl Shop {
    pub fn new(data_dir: &Path, files: &DataFiles) -> Self {
        Shop {
            customers: RecordStore::new(data_dir.join(&files.customers)),
            vehicles: RecordStore::new(data_dir.join(&files.vehicles)),
            services: RecordStore::new(data_dir.join(&files.services)),
            discounts: RecordStore::new(data_dir.join(&files.discounts)),
            history: RecordStore::new(data_dir.join(&files.history)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Shop::new(&config.data_dir, &config.files)
    }

    /// Seeds the default services and discounts where those files are empty.
    pub fn ensure_defaults(&self) -> ShopResult<()> {
        self.services.ensure_defaults()?;
        self.discounts.ensure_defaults()?;
        Ok(())
    }

    // --- customers ---

    pub fn add_customer(&self, name: &str, phone: &str, email: &str) -> ShopResult<Customer> {
        append_new(&self.customers, |id| Customer {
            id,
            name: name.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
        })
    }

    pub fn customers(&self) -> ShopResult<Vec<Customer>> {
        Ok(self.customers.load_all()?)
    }

    pub fn find_customer(&self, id: i64) -> ShopResult<Customer> {
        self.customers
            .load_all()?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found::<Customer>(id))
    }

    pub fn update_customer(&self, id: i64, update: CustomerUpdate) -> ShopResult<Customer> {
        update_by_id(&self.customers, id, |c| {
            replace_text(&mut c.name, update.name);
            replace_text(&mut c.phone, update.phone);
            replace_text(&mut c.email, update.email);
            Ok(())
        })
    }

    pub fn delete_customer(&self, id: i64) -> ShopResult<()> {
        delete_by_id(&self.customers, id)
    }

    // --- vehicles ---

    /// Registers a vehicle. The owner id is stored as given, without checking
    /// that such a customer exists.
    pub fn register_vehicle(&self, customer_id: i64, reg_no: &str, model: &str, color: &str) -> ShopResult<Vehicle> {
        append_new(&self.vehicles, |id| Vehicle {
            id,
            customer_id,
            reg_no: reg_no.to_string(),
            model: model.to_string(),
            color: color.to_string(),
        })
    }

    pub fn vehicles(&self) -> ShopResult<Vec<Vehicle>> {
        Ok(self.vehicles.load_all()?)
    }

    pub fn vehicles_for_customer(&self, customer_id: i64) -> ShopResult<Vec<Vehicle>> {
        Ok(self
            .vehicles
            .load_all()?
            .into_iter()
            .filter(|v| v.customer_id == customer_id)
            .collect())
    }

    pub fn update_vehicle(&self, id: i64, update: VehicleUpdate) -> ShopResult<Vehicle> {
        update_by_id(&self.vehicles, id, |v| {
            replace(&mut v.customer_id, update.customer_id);
            replace_text(&mut v.reg_no, update.reg_no);
            replace_text(&mut v.model, update.model);
            replace_text(&mut v.color, update.color);
            Ok(())
        })
    }

    pub fn delete_vehicle(&self, id: i64) -> ShopResult<()> {
        delete_by_id(&self.vehicles, id)
    }

    /// Returns how many vehicles were removed. The file is only rewritten if
    /// there was something to remove.
    pub fn delete_vehicles_for_customer(&self, customer_id: i64) -> ShopResult<usize> {
        let mut vehicles = self.vehicles.load_all()?;
        let before = vehicles.len();
        vehicles.retain(|v| v.customer_id != customer_id);
        let removed = before - vehicles.len();
        if removed > 0 {
            self.vehicles.save_all(&vehicles)?;
            log::info!("Deleted {} vehicle(s) of customer {}", removed, customer_id);
        }
        Ok(removed)
    }

    // --- services ---

    pub fn add_service(&self, name: &str, price: f64) -> ShopResult<ServiceItem> {
        let price = validate_price(price)?;
        append_new(&self.services, |id| ServiceItem { id, name: name.to_string(), price })
    }

    /// The service catalog, seeded with defaults if empty.
    pub fn services(&self) -> ShopResult<Vec<ServiceItem>> {
        self.services.ensure_defaults()?;
        Ok(self.services.load_all()?)
    }

    pub fn update_service(&self, id: i64, update: ServiceUpdate) -> ShopResult<ServiceItem> {
        let price = update.price.map(validate_price).transpose()?;
        update_by_id(&self.services, id, |s| {
            replace_text(&mut s.name, update.name);
            replace(&mut s.price, price);
            Ok(())
        })
    }

    pub fn delete_service(&self, id: i64) -> ShopResult<()> {
        delete_by_id(&self.services, id)
    }

    // --- discounts ---

    pub fn add_discount(&self, name: &str, percent: f64, note: &str) -> ShopResult<Discount> {
        append_new(&self.discounts, |id| Discount {
            id,
            name: name.to_string(),
            percent,
            note: note.to_string(),
        })
    }

    /// The discount list, seeded with defaults if empty.
    pub fn discounts(&self) -> ShopResult<Vec<Discount>> {
        self.discounts.ensure_defaults()?;
        Ok(self.discounts.load_all()?)
    }

    pub fn update_discount(&self, id: i64, update: DiscountUpdate) -> ShopResult<Discount> {
        update_by_id(&self.discounts, id, |d| {
            replace_text(&mut d.name, update.name);
            replace(&mut d.percent, update.percent);
            replace_text(&mut d.note, update.note);
            Ok(())
        })
    }

    pub fn delete_discount(&self, id: i64) -> ShopResult<()> {
        delete_by_id(&self.discounts, id)
    }

    // --- bookings ---

    /// Books `service_ids` for a customer's vehicle and records a Pending history entry.
    ///
    /// A `discount_id` that does not match any discount is recorded as no discount.
    pub fn book_service(
        &self,
        customer_id: i64,
        vehicle_id: i64,
        service_ids: &[i64],
        discount_id: Option<i64>,
    ) -> ShopResult<HistoryEntry> {
        self.find_customer(customer_id)?;

        let vehicle = self
            .vehicles
            .load_all()?
            .into_iter()
            .find(|v| v.id == vehicle_id)
            .ok_or_else(|| not_found::<Vehicle>(vehicle_id))?;
        if vehicle.customer_id != customer_id {
            return Err(ShopError::VehicleNotOwned { vehicle_id, customer_id });
        }

        if service_ids.is_empty() {
            return Err(ShopError::NoServices);
        }
        let catalog = self.services()?;
        let mut subtotal = 0.0;
        for &sid in service_ids {
            let service = catalog
                .iter()
                .find(|s| s.id == sid)
                .ok_or_else(|| not_found::<ServiceItem>(sid))?;
            subtotal += service.price;
        }

        let discounts = self.discounts()?;
        let discount = discount_id.and_then(|did| {
            let found = discounts.iter().find(|d| d.id == did);
            if found.is_none() {
                log::warn!("Discount {} not found, booking without discount", did);
            }
            found
        });
        let (discount_id, discount_percent) = match discount {
            Some(d) => (d.id, d.percent),
            None => (NO_DISCOUNT, 0.0),
        };

        let mut entry = HistoryEntry {
            history_id: 0,
            customer_id,
            vehicle_id,
            service_ids: service_ids.to_vec(),
            date_time: current_date_time(),
            subtotal,
            discount_id,
            discount_percent,
            total: 0.0,
            status: HistoryStatus::Pending,
        };
        entry.total = subtotal - entry.discount_amount();

        append_new(&self.history, |history_id| HistoryEntry { history_id, ..entry })
    }

    pub fn history(&self) -> ShopResult<Vec<HistoryEntry>> {
        Ok(self.history.load_all()?)
    }

    pub fn bill(&self, history_id: i64) -> ShopResult<Bill> {
        let entry = self
            .history
            .load_all()?
            .into_iter()
            .find(|h| h.history_id == history_id)
            .ok_or_else(|| not_found::<HistoryEntry>(history_id))?;
        let catalog = self.services.load_all()?;
        let lines = entry
            .service_ids
            .iter()
            .filter_map(|sid| catalog.iter().find(|s| s.id == *sid).cloned())
            .collect();
        Ok(Bill { entry, lines })
    }

    pub fn mark_completed(&self, history_id: i64) -> ShopResult<HistoryEntry> {
        update_by_id(&self.history, history_id, |h| {
            h.status = HistoryStatus::Completed;
            Ok(())
        })
    }

    /// Completes all of a customer's pending bookings, then removes their
    /// vehicles and the customer record.
    ///
    /// If the customer has nothing pending, nothing is changed.
    pub fn checkout_customer(&self, customer_id: i64) -> ShopResult<Checkout> {
        let mut history = self.history.load_all()?;
        let mut completed = 0;
        for entry in history
            .iter_mut()
            .filter(|h| h.customer_id == customer_id && h.status == HistoryStatus::Pending)
        {
            entry.status = HistoryStatus::Completed;
            completed += 1;
        }
        if completed == 0 {
            log::info!("No pending bookings for customer {}", customer_id);
            return Ok(Checkout::default());
        }
        self.history.save_all(&history)?;

        let vehicles_removed = self.delete_vehicles_for_customer(customer_id)?;
        let customer_removed = match self.delete_customer(customer_id) {
            Ok(()) => true,
            Err(ShopError::NotFound { .. }) => false,
            Err(e) => return Err(e),
        };

        Ok(Checkout { completed, vehicles_removed, customer_removed })
    }
}
