use crate::amount::sanitize_amount;
use serde::{Deserialize, Serialize};

/// The two user-adjustable parameters of the metrics computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Account value before the first entry.
    pub starting_balance: f64,
    /// Conversion factor applied to cumulative withdrawals for display.
    pub exchange_rate: f64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            starting_balance: 0.0,
            exchange_rate: 1.0,
        }
    }
}

impl LedgerSettings {
    /// Applies a partial update. Non-finite values are ignored.
    pub fn apply(&mut self, update: &SettingsUpdate) {
        if let Some(balance) = update.starting_balance.filter(|v| v.is_finite()) {
            self.starting_balance = sanitize_amount(balance);
        }
        if let Some(rate) = update.exchange_rate.filter(|v| v.is_finite()) {
            self.exchange_rate = sanitize_amount(rate);
        }
    }
}

/// A partial settings change, as sent by `PUT /api/settings` or the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub starting_balance: Option<f64>,
    #[serde(default)]
    pub exchange_rate: Option<f64>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.starting_balance.is_none() && self.exchange_rate.is_none()
    }
}
