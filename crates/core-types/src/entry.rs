use crate::amount::{deserialize_lenient_amount, deserialize_lenient_text, sanitize_amount};
use crate::calendar::parse_entry_date;
use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One user-submitted ledger event, as it arrives from a form, an API call or
/// a spreadsheet row. The date is still text; it is only validated when the
/// entry is stored or fed to the metrics engine.
///
/// Field names are accepted in both capitalized (`Date`, `Gain`, ...) and
/// lower-case form. Amount fields never fail to deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    #[serde(alias = "Date", default, deserialize_with = "deserialize_lenient_text")]
    pub date: String,
    #[serde(alias = "Gain", default, deserialize_with = "deserialize_lenient_amount")]
    pub gain: f64,
    #[serde(alias = "Loss", default, deserialize_with = "deserialize_lenient_amount")]
    pub loss: f64,
    #[serde(alias = "Withdrawal", default, deserialize_with = "deserialize_lenient_amount")]
    pub withdrawal: f64,
    #[serde(alias = "Deposit", default, deserialize_with = "deserialize_lenient_amount")]
    pub deposit: f64,
}

impl RawEntry {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Default::default()
        }
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_loss(mut self, loss: f64) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_withdrawal(mut self, withdrawal: f64) -> Self {
        self.withdrawal = withdrawal;
        self
    }

    pub fn with_deposit(mut self, deposit: f64) -> Self {
        self.deposit = deposit;
        self
    }
}

/// A validated entry that is ready to be stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub gain: f64,
    pub loss: f64,
    pub withdrawal: f64,
    pub deposit: f64,
}

impl TryFrom<&RawEntry> for NewEntry {
    type Error = CoreError;

    fn try_from(raw: &RawEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            date: parse_entry_date(&raw.date)?,
            gain: sanitize_amount(raw.gain),
            loss: sanitize_amount(raw.loss),
            withdrawal: sanitize_amount(raw.withdrawal),
            deposit: sanitize_amount(raw.deposit),
        })
    }
}

/// A stored entry. The `id` is assigned once at insertion and is the only
/// durable identity an entry has; positions in computed series are not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Entry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub gain: f64,
    pub loss: f64,
    pub withdrawal: f64,
    pub deposit: f64,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Builds a stored entry with a freshly generated identifier.
    pub fn create(new_entry: &NewEntry) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: new_entry.date,
            gain: new_entry.gain,
            loss: new_entry.loss,
            withdrawal: new_entry.withdrawal,
            deposit: new_entry.deposit,
            created_at: Utc::now(),
        }
    }
}

impl From<&Entry> for RawEntry {
    fn from(entry: &Entry) -> Self {
        Self {
            date: entry.date.format("%Y-%m-%d").to_string(),
            gain: entry.gain,
            loss: entry.loss,
            withdrawal: entry.withdrawal,
            deposit: entry.deposit,
        }
    }
}

impl From<&NewEntry> for RawEntry {
    fn from(entry: &NewEntry) -> Self {
        Self {
            date: entry.date.format("%Y-%m-%d").to_string(),
            gain: entry.gain,
            loss: entry.loss,
            withdrawal: entry.withdrawal,
            deposit: entry.deposit,
        }
    }
}
