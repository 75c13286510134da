//! Forecast API response DTOs.
//!
//! Only the fields the feature builder reads are modelled; the API sends
//! many more, which serde ignores.

use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use serde::Deserialize;

/// Response from the 5-day / 3-hour forecast endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Forecast {
    /// Forecast entries in chronological order.
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
}

/// One forecast time slot.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntry {
    /// Slot start, Unix seconds.
    pub dt: i64,

    pub main: MainReadings,
}

/// Core readings for a slot. Temperature is in Kelvin unless the request
/// asked for other units.
#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
}

impl Forecast {
    /// Temperature of the first slot whose local hour is `hour`.
    ///
    /// The date is not considered, so for a departure several days out
    /// this may return an earlier day's reading.
    ///
    /// The `/data/2.5/forecast` endpoint reports every three hours, so only
    /// hours that fall on a slot boundary in `tz` match. Other hours get
    /// `None` and the caller uses its fallback temperature.
    pub fn temperature_at_hour(&self, hour: u32, tz: Tz) -> Option<f64> {
        self.list
            .iter()
            .find(|entry| {
                DateTime::from_timestamp(entry.dt, 0)
                    .is_some_and(|t| t.with_timezone(&tz).hour() == hour)
            })
            .map(|entry| entry.main.temp)
    }
}
