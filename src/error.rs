// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Why a single line could not be turned into a record.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("invalid integer in field '{field}': {value:?}")]
    InvalidInteger { field: &'static str, value: String },
    #[error("invalid decimal in field '{field}': {value:?}")]
    InvalidDecimal { field: &'static str, value: String },
    #[error("invalid id list in field '{field}': bad token {token:?}")]
    InvalidIdList { field: &'static str, token: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No ids left in {path:?}: largest id is already {max}")]
    IdsExhausted { path: PathBuf, max: i64 },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io { path: path.into(), source }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Config file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
    #[error("Vehicle {vehicle_id} does not belong to customer {customer_id}")]
    VehicleNotOwned { vehicle_id: i64, customer_id: i64 },
    #[error("No services selected")]
    NoServices,
    #[error("Invalid price {0}: must be a number >= 0")]
    InvalidPrice(f64),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Shop(#[from] ShopError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("CLI error: {0}")]
    Cli(String),
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
pub type StoreResult<T> = Result<T, StoreError>;
pub type ShopResult<T> = Result<T, ShopError>;
