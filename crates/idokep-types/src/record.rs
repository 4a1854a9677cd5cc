//! The observation record handed over by the host engine.
//!
//! A record is a timestamp, a unit system tag and a flat map of named
//! measurements. Any measurement may be absent or explicitly `null`; both
//! mean "no reading" and are treated the same by [`ObservationRecord::get`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::units::UnitSystem;

/// Well-known field names used by the host engine.
pub mod fields {
    /// Outside temperature.
    pub const OUT_TEMP: &str = "outTemp";
    /// Outside relative humidity, percent.
    pub const OUT_HUMIDITY: &str = "outHumidity";
    /// Wind direction, compass degrees.
    pub const WIND_DIR: &str = "windDir";
    /// Average wind speed.
    pub const WIND_SPEED: &str = "windSpeed";
    /// Wind gust speed.
    pub const WIND_GUST: &str = "windGust";
    /// Sea-level corrected barometric pressure.
    pub const BAROMETER: &str = "barometer";
    /// Rain accumulated over the last 24 hours.
    pub const RAIN_24: &str = "rain24";
    /// Rain accumulated over the last hour.
    pub const HOUR_RAIN: &str = "hourRain";
    /// Rain accumulated since midnight.
    pub const DAY_RAIN: &str = "dayRain";
    /// Current rain rate.
    pub const RAIN_RATE: &str = "rainRate";
}

/// One timestamped set of weather measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Unix epoch seconds of the end of the archive interval.
    #[serde(rename = "dateTime")]
    pub date_time: i64,

    /// Unit system of every value in [`fields`](Self::fields).
    #[serde(rename = "usUnits", default)]
    pub us_units: UnitSystem,

    /// Measurements keyed by field name. `None` is an explicit null.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Option<f64>>,
}

impl ObservationRecord {
    /// Create an empty record for the given time and unit system.
    pub const fn new(date_time: i64, us_units: UnitSystem) -> Self {
        Self {
            date_time,
            us_units,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style setter for a single measurement.
    #[must_use]
    pub fn with(mut self, field: &str, value: f64) -> Self {
        self.fields.insert(field.to_owned(), Some(value));
        self
    }

    /// Builder-style setter for an explicit null measurement.
    #[must_use]
    pub fn with_null(mut self, field: &str) -> Self {
        self.fields.insert(field.to_owned(), None);
        self
    }

    /// The value of `field`, or `None` when it is absent, null or not finite.
    pub fn get(&self, field: &str) -> Option<f64> {
        self.fields
            .get(field)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }

    /// Replace the value of `field`.
    pub fn set(&mut self, field: &str, value: Option<f64>) {
        self.fields.insert(field.to_owned(), value);
    }

    /// The record timestamp, if it is representable.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.date_time, 0)
    }
}
