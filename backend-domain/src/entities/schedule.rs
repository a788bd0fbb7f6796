// Schedule window entity
// Admin-managed open/close window, wall-clock values in the festival timezone

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::normalize_optional_text;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    /// Calendar date, `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,
    /// Wall-clock `HH:MM`.
    #[serde(default)]
    pub open_time: Option<String>,
    /// Wall-clock `HH:MM`; earlier than `open_time` means the next day.
    #[serde(default)]
    pub close_time: Option<String>,
    #[serde(default)]
    pub require_verification: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ScheduleWindow {
    pub fn new(date: &str, open_time: &str, close_time: &str) -> Self {
        Self {
            date: Some(date.to_string()),
            open_time: Some(open_time.to_string()),
            close_time: Some(close_time.to_string()),
            require_verification: false,
            updated_at: None,
        }
    }

    /// Empty strings count as unset.
    pub fn normalized(mut self) -> Self {
        self.date = normalize_optional_text(self.date);
        self.open_time = normalize_optional_text(self.open_time);
        self.close_time = normalize_optional_text(self.close_time);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStatus {
    pub open: bool,
    pub ended: bool,
    pub require_verification: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opens_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closes_at: Option<DateTime<Utc>>,
}
