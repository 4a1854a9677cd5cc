//! Request formatting for the Idokep endpoint.
//!
//! The endpoint takes a single GET with every value in the query string.
//! Parameter names are fixed by Idokep (Hungarian abbreviations):
//!
//! | key | meaning | precision |
//! |---|---|---|
//! | `user`, `pass` | credentials | |
//! | `ev` `ho` `nap` `ora` `perc` `mp` | local year, month, day, hour, minute, second | |
//! | `hom` | outside temperature, C | `%.1f` |
//! | `rh` | outside humidity, % | `%.0f` |
//! | `szelirany` | wind direction, degrees | `%.0f` |
//! | `szelero` | wind speed, m/s | `%.1f` |
//! | `szellokes` | wind gust, m/s | `%.1f` |
//! | `p` | barometer, hPa | `%.1f` |
//! | `csap` | rain over 24 hours, mm | `%.2f` |
//! | `csap1h` | rain over the last hour, mm | `%.2f` |
//! | `tipus` | station type | |
//!
//! A missing measurement is sent as an empty value, never as zero.

use chrono::Local;
use idokep_types::{ObservationRecord, fields};
use reqwest::{Method, Url};

use crate::error::UploadError;
use crate::units::UnitConverter;

/// Turns a record into an outgoing request.
pub trait RequestFormatter: Send + Sync + 'static {
    /// Build the request for `record`.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Format`] if the record cannot be represented.
    fn format(&self, record: &ObservationRecord) -> Result<UploadRequest, UploadError>;
}

/// A fully formed outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// HTTP method.
    pub method: Method,
    /// Endpoint; any query it already carries is kept ahead of `params`.
    pub base_url: Url,
    /// Query parameters in wire order, not yet percent-encoded.
    pub params: Vec<(&'static str, String)>,
}

impl UploadRequest {
    /// The complete URL with percent-encoded query parameters.
    pub fn url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .extend_pairs(self.params.iter().map(|(k, v)| (*k, v.as_str())));
        url
    }

    /// The URL with the credential masked, for logging.
    pub fn redacted_url(&self) -> String {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().extend_pairs(self.params.iter().map(|(k, v)| {
            if *k == PASSWORD_KEY {
                (*k, "XXX")
            } else {
                (*k, v.as_str())
            }
        }));
        url.to_string()
    }

    /// Look up a parameter value by key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

const PASSWORD_KEY: &str = "pass";

/// Credentials, time components, measurements and station type.
const PARAM_COUNT: usize = 17;

/// Optional measurement parameters: query key, record field, decimals.
const MEASUREMENTS: [(&str, &str, usize); 8] = [
    ("hom", fields::OUT_TEMP, 1),
    ("rh", fields::OUT_HUMIDITY, 0),
    ("szelirany", fields::WIND_DIR, 0),
    ("szelero", fields::WIND_SPEED, 1),
    ("szellokes", fields::WIND_GUST, 1),
    ("p", fields::BAROMETER, 1),
    ("csap", fields::RAIN_24, 2),
    ("csap1h", fields::HOUR_RAIN, 2),
];

/// Local-time components: query key and `strftime` pattern.
const TIME_COMPONENTS: [(&str, &str); 6] = [
    ("ev", "%Y"),
    ("ho", "%m"),
    ("nap", "%d"),
    ("ora", "%H"),
    ("perc", "%M"),
    ("mp", "%S"),
];

/// Formatter for the Idokep `sendws.php` endpoint.
#[derive(Debug, Clone)]
pub struct IdokepFormatter<C> {
    username: String,
    password: String,
    station_type: String,
    server_url: Url,
    converter: C,
}

impl<C: UnitConverter> IdokepFormatter<C> {
    /// Create a formatter for one account.
    pub const fn new(
        username: String,
        password: String,
        station_type: String,
        server_url: Url,
        converter: C,
    ) -> Self {
        Self {
            username,
            password,
            station_type,
            server_url,
            converter,
        }
    }
}

impl<C: UnitConverter> RequestFormatter for IdokepFormatter<C> {
    fn format(&self, record: &ObservationRecord) -> Result<UploadRequest, UploadError> {
        let record = self.converter.to_metricwx(record);
        let local = record
            .timestamp()
            .ok_or_else(|| {
                UploadError::Format(format!("timestamp {} out of range", record.date_time))
            })?
            .with_timezone(&Local);

        let mut params = Vec::with_capacity(PARAM_COUNT);
        params.push(("user", self.username.clone()));
        params.push((PASSWORD_KEY, self.password.clone()));
        for (key, pattern) in TIME_COMPONENTS {
            params.push((key, local.format(pattern).to_string()));
        }
        for (key, field, decimals) in MEASUREMENTS {
            params.push((key, format_value(record.get(field), decimals)));
        }
        params.push(("tipus", self.station_type.clone()));

        Ok(UploadRequest {
            method: Method::GET,
            base_url: self.server_url.clone(),
            params,
        })
    }
}

/// Render a measurement with fixed decimals, or empty when missing.
fn format_value(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(String::new, |v| format!("{v:.decimals$}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Datelike, TimeZone, Timelike};
    use idokep_types::UnitSystem;

    use super::*;
    use crate::units::StandardConverter;

    const ALL_KEYS: [&str; 17] = [
        "user", "pass", "ev", "ho", "nap", "ora", "perc", "mp", "hom", "rh", "szelirany",
        "szelero", "szellokes", "p", "csap", "csap1h", "tipus",
    ];

    fn formatter() -> IdokepFormatter<StandardConverter> {
        IdokepFormatter::new(
            "station1".to_owned(),
            "p&ss word".to_owned(),
            "WS23XX".to_owned(),
            Url::parse("https://pro.idokep.hu/sendws.php").unwrap(),
            StandardConverter::new(),
        )
    }

    fn full_record() -> ObservationRecord {
        ObservationRecord::new(1_400_000_000, UnitSystem::MetricWx)
            .with(fields::OUT_TEMP, 12.34)
            .with(fields::OUT_HUMIDITY, 67.2)
            .with(fields::WIND_DIR, 181.4)
            .with(fields::WIND_SPEED, 3.26)
            .with(fields::WIND_GUST, 7.81)
            .with(fields::BAROMETER, 1013.27)
            .with(fields::RAIN_24, 4.567)
            .with(fields::HOUR_RAIN, 0.2)
    }

    #[test]
    fn full_record_has_every_key_with_precision() {
        let request = formatter().format(&full_record()).unwrap();

        let keys: Vec<&str> = request.params.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ALL_KEYS);

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.param("user"), Some("station1"));
        assert_eq!(request.param("hom"), Some("12.3"));
        assert_eq!(request.param("rh"), Some("67"));
        assert_eq!(request.param("szelirany"), Some("181"));
        assert_eq!(request.param("szelero"), Some("3.3"));
        assert_eq!(request.param("szellokes"), Some("7.8"));
        assert_eq!(request.param("p"), Some("1013.3"));
        assert_eq!(request.param("csap"), Some("4.57"));
        assert_eq!(request.param("csap1h"), Some("0.20"));
        assert_eq!(request.param("tipus"), Some("WS23XX"));
    }

    #[test]
    fn missing_fields_are_empty_not_zero() {
        let record = ObservationRecord::new(1_400_000_000, UnitSystem::MetricWx)
            .with(fields::OUT_TEMP, 0.0)
            .with_null(fields::WIND_GUST);
        let request = formatter().format(&record).unwrap();

        assert_eq!(request.params.len(), ALL_KEYS.len());
        assert_eq!(request.param("hom"), Some("0.0"));
        for key in ["rh", "szelirany", "szelero", "szellokes", "p", "csap", "csap1h"] {
            assert_eq!(request.param(key), Some(""), "{key} should be empty");
        }
    }

    #[test]
    fn time_components_recompose_to_local_time() {
        let record = full_record();
        let request = formatter().format(&record).unwrap();

        let part = |key: &str| -> u32 {
            request
                .param(key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(u32::MAX)
        };
        let year = request
            .param("ev")
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(0);
        let rebuilt = Local
            .with_ymd_and_hms(year, part("ho"), part("nap"), part("ora"), part("perc"), part("mp"))
            .earliest()
            .unwrap();
        let expected = record.timestamp().unwrap().with_timezone(&Local);

        assert_eq!(rebuilt.year(), expected.year());
        assert_eq!(rebuilt.month(), expected.month());
        assert_eq!(rebuilt.day(), expected.day());
        assert_eq!(rebuilt.hour(), expected.hour());
        assert_eq!(rebuilt.minute(), expected.minute());
        assert_eq!(rebuilt.second(), expected.second());
    }

    #[test]
    fn time_components_are_zero_padded() {
        let request = formatter().format(&full_record()).unwrap();
        for key in ["ho", "nap", "ora", "perc", "mp"] {
            assert_eq!(request.param(key).map(str::len), Some(2), "{key} should be two digits");
        }
        assert_eq!(request.param("ev").map(str::len), Some(4));
    }

    #[test]
    fn us_units_are_converted_before_formatting() {
        let record = ObservationRecord::new(1_400_000_000, UnitSystem::Us)
            .with(fields::OUT_TEMP, 50.0)
            .with(fields::HOUR_RAIN, 0.1);
        let request = formatter().format(&record).unwrap();
        assert_eq!(request.param("hom"), Some("10.0"));
        assert_eq!(request.param("csap1h"), Some("2.54"));
    }

    #[test]
    fn credentials_are_percent_encoded() {
        let request = formatter().format(&full_record()).unwrap();
        let url = request.url();
        let query = url.query().unwrap_or_default();
        assert!(query.contains("pass=p%26ss+word"), "query was {query}");
        assert!(query.starts_with("user=station1&pass="));
    }

    #[test]
    fn redacted_url_hides_password() {
        let request = formatter().format(&full_record()).unwrap();
        let redacted = request.redacted_url();
        assert!(redacted.contains("pass=XXX"));
        assert!(!redacted.contains("p%26ss"));
    }

    #[test]
    fn existing_query_on_server_url_is_kept() {
        let formatter = IdokepFormatter::new(
            "station1".to_owned(),
            "secret".to_owned(),
            "WS23XX".to_owned(),
            Url::parse("https://pro.idokep.hu/sendws.php?v=2").unwrap(),
            StandardConverter::new(),
        );
        let request = formatter.format(&full_record()).unwrap();

        let url = request.url();
        assert!(url.query().unwrap().starts_with("v=2&user=station1&pass=secret&ev="));
        assert!(request.redacted_url().contains("?v=2&user=station1&pass=XXX&"));
    }

    #[test]
    fn out_of_range_timestamp_is_a_format_error() {
        let record = ObservationRecord::new(i64::MAX, UnitSystem::MetricWx);
        let result = formatter().format(&record);
        assert!(matches!(result, Err(UploadError::Format(_))));
    }
}
