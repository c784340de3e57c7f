// src/codec.rs
//! One record per line, fields separated by `|`.
//!
//! There is no escaping: a `|` or newline inside a text field corrupts the
//! line it is written to. List-valued fields hold comma-joined integers in a
//! single slot.
use crate::error::DecodeError;
use std::fmt::Debug;

pub const FIELD_SEP: char = '|';
pub const LIST_SEP: char = ',';

/// A record kind that can be stored one-per-line in a flat file.
pub trait Record: Clone + Debug {
    /// Human-readable kind name, used in logs and errors.
    const KIND: &'static str;

    /// Uniqueness key within one backing file.
    fn id(&self) -> i64;

    /// Renders the record as a single line, without the trailing newline.
    fn encode(&self) -> String;

    /// Parses one line. Any numeric field that fails to parse rejects the whole line.
    fn decode(line: &str) -> Result<Self, DecodeError>
    where
        Self: Sized;
}

/// Cursor over the `|`-separated fields of one line.
///
/// Fields missing from the end of the line read as empty strings, so a short
/// line only fails if one of the missing fields is numeric.
pub struct Fields<'a> {
    inner: std::str::Split<'a, char>,
}

impl<'a> Fields<'a> {
    pub fn new(line: &'a str) -> Self {
        Fields { inner: line.split(FIELD_SEP) }
    }

    fn next_raw(&mut self) -> &'a str {
        self.inner.next().unwrap_or("")
    }

    pub fn text(&mut self) -> String {
        self.next_raw().to_string()
    }

    pub fn integer(&mut self, field: &'static str) -> Result<i64, DecodeError> {
        let raw = self.next_raw();
        parse_integer(raw).ok_or_else(|| DecodeError::InvalidInteger {
            field,
            value: raw.to_string(),
        })
    }

    pub fn decimal(&mut self, field: &'static str) -> Result<f64, DecodeError> {
        let raw = self.next_raw();
        raw.trim().parse::<f64>().map_err(|_| DecodeError::InvalidDecimal {
            field,
            value: raw.to_string(),
        })
    }

    /// Reads a comma-joined id list. Empty tokens are dropped, so an empty slot
    /// yields an empty list.
    pub fn id_list(&mut self, field: &'static str) -> Result<Vec<i64>, DecodeError> {
        let raw = self.next_raw();
        raw.split(LIST_SEP)
            .filter(|token| !token.is_empty())
            .map(|token| {
                parse_integer(token).ok_or_else(|| DecodeError::InvalidIdList {
                    field,
                    token: token.to_string(),
                })
            })
            .collect()
    }
}

fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Parses only the leading id of a line, ignoring everything after the first `|`.
pub fn leading_id(line: &str) -> Option<i64> {
    line.split(FIELD_SEP).next().and_then(parse_integer)
}

pub fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(&LIST_SEP.to_string())
}
