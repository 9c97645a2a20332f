use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{auth::password::is_valid_email, error::AppError};

pub type SettingsMap = BTreeMap<String, String>;

/// Known system settings; unknown keys in the body are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsUpdate {
    pub kindergarten_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub low_stock_threshold_days: Option<i64>,
    pub auto_reorder_enabled: Option<bool>,
    pub notification_email: Option<String>,
    pub timezone: Option<String>,
    pub currency: Option<String>,
}

impl SettingsUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("email", &self.email),
            ("notification_email", &self.notification_email),
        ] {
            if matches!(value, Some(v) if !v.is_empty() && !is_valid_email(v)) {
                return Err(AppError::bad_request(format!("{field} is not a valid email")));
            }
        }
        if matches!(self.low_stock_threshold_days, Some(d) if d < 0) {
            return Err(AppError::bad_request("low_stock_threshold_days must not be negative"));
        }
        Ok(())
    }

    /// Supplied fields as stored `(key, value)` pairs.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let mut text = |key: &'static str, v: &Option<String>| {
            if let Some(v) = v {
                out.push((key, v.clone()));
            }
        };
        text("kindergarten_name", &self.kindergarten_name);
        text("address", &self.address);
        text("phone", &self.phone);
        text("email", &self.email);
        text("notification_email", &self.notification_email);
        text("timezone", &self.timezone);
        text("currency", &self.currency);
        if let Some(days) = self.low_stock_threshold_days {
            out.push(("low_stock_threshold_days", days.to_string()));
        }
        if let Some(enabled) = self.auto_reorder_enabled {
            out.push(("auto_reorder_enabled", enabled.to_string()));
        }
        out
    }
}
