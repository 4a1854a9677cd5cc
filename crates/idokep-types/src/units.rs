//! Unit system tags.
//!
//! The host engine stamps every record with a numeric unit system tag
//! (`usUnits`). The values are fixed by the host and must not change.

use serde::{Deserialize, Serialize};

/// The unit system a record's values are expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum UnitSystem {
    /// Fahrenheit, mph, inHg, inches.
    #[default]
    Us,
    /// Celsius, km/h, mbar, centimetres.
    Metric,
    /// Celsius, m/s, mbar, millimetres.
    MetricWx,
}

impl UnitSystem {
    /// The numeric tag the host engine uses for this system.
    pub const fn code(self) -> i32 {
        match self {
            Self::Us => 1,
            Self::Metric => 16,
            Self::MetricWx => 17,
        }
    }
}

impl From<UnitSystem> for i32 {
    fn from(system: UnitSystem) -> Self {
        system.code()
    }
}

impl TryFrom<i32> for UnitSystem {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Us),
            16 => Ok(Self::Metric),
            17 => Ok(Self::MetricWx),
            other => Err(format!("unknown unit system code: {other}")),
        }
    }
}

impl core::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Us => "US",
            Self::Metric => "METRIC",
            Self::MetricWx => "METRICWX",
        };
        f.write_str(name)
    }
}
