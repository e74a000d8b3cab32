//! Observation Schema
//!
//! Column names of the joined sensor/weather table and the named feature
//! groups derived from it.

/// Reading timestamp.
pub const DATE: &str = "data";
/// Sensor identifier.
pub const SENSOR_ID: &str = "idsensore";
/// Sensor type (pollutant) label.
pub const SENSOR_TYPE: &str = "nometiposensore";
/// Station identifier.
pub const STATION_ID: &str = "idstazione";
/// Pollutant value.
pub const VALUE: &str = "valore";
/// Free-text weather phenomena, e.g. `"pioggia nebbia"`.
pub const PHENOMENA: &str = "fenomeni";
/// Seconds since the Unix epoch, used as a smooth time index.
pub const TIME_INDEX: &str = "date_unix";

/// Weather covariates declared by the weather ingestion step.
pub const WEATHER_COLUMNS: [&str; 5] = [
    "tmedia celsius",
    "umidita perc",
    "ventomedia kmh",
    "pressioneslm mb",
    "pioggia mm",
];

/// Compact calendar set: numeric calendar position without indicator noise.
pub const CALENDAR_COLUMNS: [&str; 4] = ["year", "day", "weekofyear", "dayofyear"];

/// Weekday indicator columns, Monday first.
pub const WEEKDAY_COLUMNS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Month indicator columns, January first.
pub const MONTH_COLUMNS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Columns identifying a sensor; expanded into indicators in cross-sensor mode.
pub const SENSOR_IDENTITY_COLUMNS: [&str; 3] = [SENSOR_ID, SENSOR_TYPE, STATION_ID];

/// Full date feature set: compact calendar columns plus weekday and month indicators.
pub fn date_columns() -> Vec<&'static str> {
    CALENDAR_COLUMNS
        .iter()
        .chain(WEEKDAY_COLUMNS.iter())
        .chain(MONTH_COLUMNS.iter())
        .copied()
        .collect()
}

/// Declared weather covariates as owned names.
pub fn weather_columns() -> Vec<String> {
    WEATHER_COLUMNS.iter().map(|c| (*c).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_columns_layout() {
        let cols = date_columns();
        assert_eq!(cols.len(), 4 + 7 + 12);
        assert_eq!(&cols[..4], &CALENDAR_COLUMNS);
        assert!(cols.contains(&"Sunday"));
        assert!(cols.contains(&"December"));
        assert!(!cols.contains(&TIME_INDEX));
    }

    #[test]
    fn test_weather_columns_owned() {
        let cols = weather_columns();
        assert_eq!(cols.len(), WEATHER_COLUMNS.len());
        assert_eq!(cols[0], "tmedia celsius");
    }
}
