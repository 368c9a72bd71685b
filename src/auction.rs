use chrono::{NaiveDateTime, SubsecRound, Utc};
use thiserror::Error;

pub type BidId = i64;
pub type Amount = f64;
pub type Timestamp = NaiveDateTime;

pub const MAX_USERNAME_LEN: usize = 50;

/// How timestamps are written to the store: ISO-8601, UTC, no offset
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
/// Accepts rows written with or without the fractional part
pub const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Please enter a valid name before bidding.")]
    BlankUsername,
    #[error("Name must be at most 50 characters long.")]
    UsernameTooLong,
    #[error("Bid amount must be a non-negative number.")]
    InvalidAmount,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bid {
    pub id: BidId,
    pub username: String,
    pub amount: Amount,
    pub timestamp: Timestamp,
}

impl Bid {
    /// Whether `self` beats `other` for the lead
    ///
    /// Higher amount wins; on equal amounts the earlier bid keeps the lead.
    pub fn leads(&self, other: &Bid) -> bool {
        match self.amount.total_cmp(&other.amount) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => (self.timestamp, self.id) < (other.timestamp, other.id),
        }
    }
}

/// Result of a conditional insert
#[derive(Clone, Debug, PartialEq)]
pub enum Placement {
    Placed(Bid),
    /// Nothing was written; the current lead is at least this much
    Outbid { leader_amount: Amount },
}

/// Current UTC time at the precision the store keeps
pub fn now() -> Timestamp {
    Utc::now().naive_utc().trunc_subsecs(6)
}

pub fn format_timestamp(timestamp: &Timestamp) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Result<Timestamp, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_PARSE_FORMAT)
}

pub fn normalize_username(raw: &str) -> Result<String, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::BlankUsername);
    }
    if trimmed.chars().count() > MAX_USERNAME_LEN {
        return Err(InputError::UsernameTooLong);
    }
    Ok(trimmed.to_owned())
}

/// Above this an f64 has no cents left to round, and scaling could overflow
const ROUNDING_LIMIT: Amount = 1e15;

/// Validate and round to cents
pub fn normalize_amount(amount: Amount) -> Result<Amount, InputError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(InputError::InvalidAmount);
    }
    if amount >= ROUNDING_LIMIT {
        return Ok(amount);
    }
    Ok((amount * 100.0).round() / 100.0)
}

/// Parse only; `normalize_amount` does the checking
pub fn parse_amount(raw: &str) -> Result<Amount, InputError> {
    raw.trim()
        .parse::<Amount>()
        .map_err(|_| InputError::InvalidAmount)
}
