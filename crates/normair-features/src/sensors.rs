//! Sensor-identity indicator features.
//!
//! Used only when several sensors share one model: each identity column is
//! expanded into one 0/1 column per distinct value, named `{column}_{value}`.

use crate::error::{FeatureError, Result};
use polars::prelude::*;
use std::collections::BTreeSet;

/// Values of `column` rendered as strings, one per row.
///
/// Identifiers may arrive as integers or strings depending on the source, so
/// the column is cast to `String` before reading.
pub fn string_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let values = df
        .column(column)
        .map_err(|_| FeatureError::MissingColumn(column.to_string()))?
        .cast(&DataType::String)?;
    Ok(values
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Indicator columns for every distinct value of every identity column.
///
/// Values are emitted in sorted order; nulls receive no indicator.
pub fn sensor_dummy_columns(df: &DataFrame, columns: &[&str]) -> Result<Vec<Column>> {
    let mut out = Vec::new();
    for column in columns {
        let values = string_values(df, column)?;
        let distinct: BTreeSet<&str> = values.iter().flatten().map(String::as_str).collect();
        for value in distinct {
            let flags: Vec<i32> = values
                .iter()
                .map(|v| i32::from(v.as_deref() == Some(value)))
                .collect();
            out.push(Column::new(format!("{column}_{value}").into(), flags));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SENSOR_ID, STATION_ID};

    #[test]
    fn test_dummies_per_distinct_value() {
        let df = DataFrame::new(vec![
            Column::new(SENSOR_ID.into(), ["5504", "6328", "5504"]),
            Column::new(STATION_ID.into(), [Some(501i64), None, Some(501)]),
        ])
        .unwrap();
        let out = DataFrame::new(sensor_dummy_columns(&df, &[SENSOR_ID, STATION_ID]).unwrap()).unwrap();

        let names: Vec<String> = out
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["idsensore_5504", "idsensore_6328", "idstazione_501"]);

        let first: Vec<i32> = out.column("idsensore_5504").unwrap().i32().unwrap().into_no_null_iter().collect();
        assert_eq!(first, vec![1, 0, 1]);
        let station: Vec<i32> = out.column("idstazione_501").unwrap().i32().unwrap().into_no_null_iter().collect();
        assert_eq!(station, vec![1, 0, 1]);
    }

    #[test]
    fn test_missing_identity_column() {
        let df = DataFrame::new(vec![Column::new(SENSOR_ID.into(), ["1"])]).unwrap();
        assert!(matches!(
            sensor_dummy_columns(&df, &[STATION_ID]),
            Err(FeatureError::MissingColumn(c)) if c == STATION_ID
        ));
    }

    #[test]
    fn test_integer_identifiers_as_strings() {
        let df = DataFrame::new(vec![Column::new(SENSOR_ID.into(), [12i64, 7])]).unwrap();
        let values = string_values(&df, SENSOR_ID).unwrap();
        assert_eq!(values, vec![Some("12".to_string()), Some("7".to_string())]);
    }
}
