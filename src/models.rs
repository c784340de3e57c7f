// src/models.rs
use crate::codec::{join_ids, Fields, Record};
use crate::error::DecodeError;
use chrono::Local;
use std::fmt;

/// `discount_id` value recorded when a booking has no discount.
pub const NO_DISCOUNT: i64 = -1;

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local wall-clock time in the format stored on history entries.
pub fn current_date_time() -> String {
    Local::now().format(DATE_TIME_FORMAT).to_string()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vehicle {
    pub id: i64,
    pub customer_id: i64, // not checked against the customer file
    pub reg_no: String,
    pub model: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discount {
    pub id: i64,
    pub name: String,
    pub percent: f64,
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HistoryStatus {
    #[default]
    Pending,
    Completed,
    /// Any other text found in the status column, including an empty one.
    /// Kept verbatim so the line is written back unchanged.
    Other(String),
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryStatus::Pending => f.write_str("Pending"),
            HistoryStatus::Completed => f.write_str("Completed"),
            HistoryStatus::Other(text) => f.write_str(text),
        }
    }
}

impl From<&str> for HistoryStatus {
    fn from(s: &str) -> Self {
        match s {
            "Pending" => HistoryStatus::Pending,
            "Completed" => HistoryStatus::Completed,
            other => HistoryStatus::Other(other.to_string()),
        }
    }
}

/// One booking: who, which vehicle, which services, and what it cost.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryEntry {
    pub history_id: i64,
    pub customer_id: i64,
    pub vehicle_id: i64,
    pub service_ids: Vec<i64>,
    pub date_time: String,
    pub subtotal: f64,
    pub discount_id: i64,
    pub discount_percent: f64,
    pub total: f64,
    pub status: HistoryStatus,
}

impl HistoryEntry {
    pub fn has_discount(&self) -> bool {
        self.discount_id != NO_DISCOUNT
    }

    pub fn discount_amount(&self) -> f64 {
        self.subtotal * (self.discount_percent / 100.0)
    }
}

impl Record for Customer {
    const KIND: &'static str = "Customer";

    fn id(&self) -> i64 {
        self.id
    }

    fn encode(&self) -> String {
        format!("{}|{}|{}|{}", self.id, self.name, self.phone, self.email)
    }

    fn decode(line: &str) -> Result<Self, DecodeError> {
        let mut f = Fields::new(line);
        Ok(Customer {
            id: f.integer("id")?,
            name: f.text(),
            phone: f.text(),
            email: f.text(),
        })
    }
}

impl Record for Vehicle {
    const KIND: &'static str = "Vehicle";

    fn id(&self) -> i64 {
        self.id
    }

    fn encode(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.id, self.customer_id, self.reg_no, self.model, self.color
        )
    }

    fn decode(line: &str) -> Result<Self, DecodeError> {
        let mut f = Fields::new(line);
        Ok(Vehicle {
            id: f.integer("id")?,
            customer_id: f.integer("customer_id")?,
            reg_no: f.text(),
            model: f.text(),
            color: f.text(),
        })
    }
}

impl Record for ServiceItem {
    const KIND: &'static str = "Service";

    fn id(&self) -> i64 {
        self.id
    }

    fn encode(&self) -> String {
        format!("{}|{}|{}", self.id, self.name, self.price)
    }

    fn decode(line: &str) -> Result<Self, DecodeError> {
        let mut f = Fields::new(line);
        Ok(ServiceItem {
            id: f.integer("id")?,
            name: f.text(),
            price: f.decimal("price")?,
        })
    }
}

impl Record for Discount {
    const KIND: &'static str = "Discount";

    fn id(&self) -> i64 {
        self.id
    }

    fn encode(&self) -> String {
        format!("{}|{}|{}|{}", self.id, self.name, self.percent, self.note)
    }

    fn decode(line: &str) -> Result<Self, DecodeError> {
        let mut f = Fields::new(line);
        Ok(Discount {
            id: f.integer("id")?,
            name: f.text(),
            percent: f.decimal("percent")?,
            note: f.text(),
        })
    }
}

impl Record for HistoryEntry {
    const KIND: &'static str = "History";

    fn id(&self) -> i64 {
        self.history_id
    }

    fn encode(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.history_id,
            self.customer_id,
            self.vehicle_id,
            join_ids(&self.service_ids),
            self.date_time,
            self.subtotal,
            self.discount_id,
            self.discount_percent,
            self.total,
            self.status
        )
    }

    fn decode(line: &str) -> Result<Self, DecodeError> {
        let mut f = Fields::new(line);
        Ok(HistoryEntry {
            history_id: f.integer("history_id")?,
            customer_id: f.integer("customer_id")?,
            vehicle_id: f.integer("vehicle_id")?,
            service_ids: f.id_list("service_ids")?,
            date_time: f.text(),
            subtotal: f.decimal("subtotal")?,
            discount_id: f.integer("discount_id")?,
            discount_percent: f.decimal("discount_percent")?,
            total: f.decimal("total")?,
            status: HistoryStatus::from(f.text().as_str()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_history(service_ids: Vec<i64>) -> HistoryEntry {
        HistoryEntry {
            history_id: 4,
            customer_id: 1,
            vehicle_id: 2,
            service_ids,
            date_time: "2024-03-01 10:15:00".to_string(),
            subtotal: 2000.0,
            discount_id: 1,
            discount_percent: 10.0,
            total: 1800.0,
            status: HistoryStatus::Pending,
        }
    }

    #[test]
    fn test_customer_line_format() {
        let c = Customer {
            id: 1,
            name: "John".to_string(),
            phone: "1234567890".to_string(),
            email: "john@example.com".to_string(),
        };
        assert_eq!(c.encode(), "1|John|1234567890|john@example.com");
        assert_eq!(Customer::decode(&c.encode()), Ok(c));
    }

    #[test]
    fn test_customer_short_line_defaults_to_empty_text() {
        let c = Customer::decode("9").unwrap();
        assert_eq!(c.id, 9);
        assert_eq!(c.name, "");
        assert_eq!(c.email, "");
    }

    #[test]
    fn test_vehicle_requires_numeric_customer_id() {
        assert!(Vehicle::decode("1|abc|KA01|Swift|Red").is_err());
        let v = Vehicle::decode("1|3|KA01|Swift|Red").unwrap();
        assert_eq!(v.customer_id, 3);
        assert_eq!(v.color, "Red");
    }

    #[test]
    fn test_decimal_rendering() {
        let s = ServiceItem { id: 1, name: "Oil Change".to_string(), price: 1200.0 };
        assert_eq!(s.encode(), "1|Oil Change|1200");
        let d = Discount { id: 2, name: "Half".to_string(), percent: 12.5, note: String::new() };
        assert_eq!(d.encode(), "2|Half|12.5|");
    }

    #[test]
    fn test_service_missing_price_is_rejected() {
        assert!(ServiceItem::decode("1|Oil Change").is_err());
        assert!(ServiceItem::decode("1|Oil Change|cheap").is_err());
    }

    #[test]
    fn test_history_line_format() {
        let h = sample_history(vec![1, 2]);
        assert_eq!(h.encode(), "4|1|2|1,2|2024-03-01 10:15:00|2000|1|10|1800|Pending");
        assert_eq!(HistoryEntry::decode(&h.encode()), Ok(h));

        let empty = sample_history(vec![]);
        assert!(empty.encode().starts_with("4|1|2||2024"));
        assert_eq!(HistoryEntry::decode(&empty.encode()), Ok(empty));
    }

    #[test]
    fn test_history_rejects_bad_list_token() {
        assert!(HistoryEntry::decode("4|1|2|1,z|2024-03-01 10:15:00|2000|1|10|1800|Pending").is_err());
    }

    #[test]
    fn test_history_keeps_unknown_or_missing_status() {
        let line = "4|1|2|1|2024-03-01 10:15:00|2000|-1|0|2000|Done";
        let h = HistoryEntry::decode(line).unwrap();
        assert_eq!(h.status, HistoryStatus::Other("Done".to_string()));
        assert_eq!(h.encode(), line);

        let short = "1|1|1|1|2024-01-01 00:00:00|100|-1|0|100";
        let h = HistoryEntry::decode(short).unwrap();
        assert_eq!(h.total, 100.0);
        assert_eq!(h.status, HistoryStatus::Other(String::new()));
        assert_eq!(h.encode(), format!("{}|", short));
    }

    #[test]
    fn test_history_discount_helpers() {
        let mut h = sample_history(vec![1]);
        assert!(h.has_discount());
        assert_eq!(h.discount_amount(), 200.0);
        h.discount_id = NO_DISCOUNT;
        assert!(!h.has_discount());
    }

    #[test]
    fn test_status_round_trip_strings() {
        assert_eq!(HistoryStatus::Completed.to_string(), "Completed");
        assert_eq!(HistoryStatus::from("Pending"), HistoryStatus::Pending);
        assert_eq!(HistoryStatus::from("Completed"), HistoryStatus::Completed);
    }

    #[test]
    fn test_current_date_time_shape() {
        let now = current_date_time();
        assert_eq!(now.len(), 19);
        assert_eq!(&now[4..5], "-");
        assert_eq!(&now[10..11], " ");
        assert_eq!(&now[13..14], ":");
    }
}
