//! Unit normalisation ahead of formatting.
//!
//! Idokep expects METRICWX values: Celsius, m/s, hPa and millimetres.
//! Conversion is a collaborator concern, so the formatter only sees the
//! [`UnitConverter`] trait. [`StandardConverter`] covers the fields this
//! uploader sends; anything else is passed through untouched.

use idokep_types::{ObservationRecord, UnitSystem, fields};

/// Converts a record into the METRICWX unit system.
pub trait UnitConverter: Send + Sync + 'static {
    /// Return a copy of `record` expressed in METRICWX units.
    fn to_metricwx(&self, record: &ObservationRecord) -> ObservationRecord;
}

/// Physical quantity a field is measured in.
#[derive(Debug, Clone, Copy)]
enum Quantity {
    Temperature,
    Speed,
    Pressure,
    Rain,
}

/// Fields that need conversion, with their quantity.
const CONVERTED_FIELDS: [(&str, Quantity); 8] = [
    (fields::OUT_TEMP, Quantity::Temperature),
    (fields::WIND_SPEED, Quantity::Speed),
    (fields::WIND_GUST, Quantity::Speed),
    (fields::BAROMETER, Quantity::Pressure),
    (fields::RAIN_24, Quantity::Rain),
    (fields::HOUR_RAIN, Quantity::Rain),
    (fields::DAY_RAIN, Quantity::Rain),
    (fields::RAIN_RATE, Quantity::Rain),
];

const MPS_PER_MPH: f64 = 0.447_04;
const HPA_PER_INHG: f64 = 33.863_886_666_7;
const MM_PER_INCH: f64 = 25.4;

/// Built-in converter for US and METRIC records.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardConverter;

impl StandardConverter {
    /// Create a new converter.
    pub const fn new() -> Self {
        Self
    }
}

impl UnitConverter for StandardConverter {
    fn to_metricwx(&self, record: &ObservationRecord) -> ObservationRecord {
        let mut converted = record.clone();
        converted.us_units = UnitSystem::MetricWx;
        if record.us_units == UnitSystem::MetricWx {
            return converted;
        }

        for (field, quantity) in CONVERTED_FIELDS {
            if let Some(value) = record.get(field) {
                converted.set(field, Some(convert(record.us_units, quantity, value)));
            }
        }
        converted
    }
}

/// Convert one value from `from` into its METRICWX equivalent.
fn convert(from: UnitSystem, quantity: Quantity, value: f64) -> f64 {
    match (from, quantity) {
        (UnitSystem::Us, Quantity::Temperature) => (value - 32.0) * 5.0 / 9.0,
        (UnitSystem::Us, Quantity::Speed) => value * MPS_PER_MPH,
        (UnitSystem::Us, Quantity::Pressure) => value * HPA_PER_INHG,
        (UnitSystem::Us, Quantity::Rain) => value * MM_PER_INCH,
        (UnitSystem::Metric, Quantity::Speed) => value / 3.6,
        (UnitSystem::Metric, Quantity::Rain) => value * 10.0,
        // Celsius and mbar are shared by METRIC and METRICWX.
        (UnitSystem::Metric, Quantity::Temperature | Quantity::Pressure)
        | (UnitSystem::MetricWx, _) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-6)
    }

    #[test]
    fn us_record_is_converted() {
        let record = ObservationRecord::new(0, UnitSystem::Us)
            .with(fields::OUT_TEMP, 212.0)
            .with(fields::WIND_SPEED, 10.0)
            .with(fields::BAROMETER, 30.0)
            .with(fields::HOUR_RAIN, 1.0)
            .with(fields::OUT_HUMIDITY, 55.0)
            .with(fields::WIND_DIR, 270.0);

        let converted = StandardConverter::new().to_metricwx(&record);

        assert_eq!(converted.us_units, UnitSystem::MetricWx);
        assert!(close(converted.get(fields::OUT_TEMP), 100.0));
        assert!(close(converted.get(fields::WIND_SPEED), 4.4704));
        assert!(close(converted.get(fields::BAROMETER), 1015.916_6));
        assert!(close(converted.get(fields::HOUR_RAIN), 25.4));
        assert!(close(converted.get(fields::OUT_HUMIDITY), 55.0));
        assert!(close(converted.get(fields::WIND_DIR), 270.0));
    }

    #[test]
    fn metric_record_is_converted() {
        let record = ObservationRecord::new(0, UnitSystem::Metric)
            .with(fields::OUT_TEMP, 21.3)
            .with(fields::WIND_GUST, 36.0)
            .with(fields::RAIN_24, 1.25);

        let converted = StandardConverter::new().to_metricwx(&record);

        assert!(close(converted.get(fields::OUT_TEMP), 21.3));
        assert!(close(converted.get(fields::WIND_GUST), 10.0));
        assert!(close(converted.get(fields::RAIN_24), 12.5));
    }

    #[test]
    fn nulls_stay_null() {
        let record = ObservationRecord::new(0, UnitSystem::Us).with_null(fields::OUT_TEMP);
        let converted = StandardConverter::new().to_metricwx(&record);
        assert_eq!(converted.get(fields::OUT_TEMP), None);
        assert!(converted.fields.contains_key(fields::OUT_TEMP));
    }
}
