use std::sync::LazyLock;

use regex::Regex;

use super::error::SchemaError;
use super::model::{Table, Value};
use super::schema::Column;

/// `POINT (lon lat)` as written in the survey's `Geolocation` column.
static POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^POINT\s*\(\s*([-+]?\d+(?:\.\d+)?)\s+([-+]?\d+(?:\.\d+)?)\s*\)$")
        .expect("invalid POINT regex")
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

/// Parse a well-known-text point. Anything that does not match is `None`.
pub fn parse_point(wkt: &str) -> Option<Coordinate> {
    let caps = POINT.captures(wkt.trim())?;
    let longitude = caps[1].parse().ok()?;
    let latitude = caps[2].parse().ok()?;
    Some(Coordinate {
        longitude,
        latitude,
    })
}

/// Add (or overwrite) `Latitude` and `Longitude` columns parsed from
/// `Geolocation`. Rows with a malformed point get missing coordinates.
pub fn geocoordinate_parse(view: &Table) -> Result<Table, SchemaError> {
    let (lats, lons): (Vec<Value>, Vec<Value>) = view
        .column(Column::Geolocation)?
        .map(|cell| match cell {
            Value::Text(s) => parse_point(s),
            _ => None,
        })
        .map(|point| match point {
            Some(c) => (Value::Float(c.latitude), Value::Float(c.longitude)),
            None => (Value::Null, Value::Null),
        })
        .unzip();

    Ok(view
        .with_column(Column::Latitude.header(), lats)
        .with_column(Column::Longitude.header(), lons))
}

/// Every row with both derived coordinates, paired with its row index.
///
/// Tables without derived coordinates yield nothing.
pub fn coordinates(view: &Table) -> Vec<(usize, Coordinate)> {
    let schema = view.schema();
    let (Some(lat), Some(lon)) = (
        schema.position(Column::Latitude),
        schema.position(Column::Longitude),
    ) else {
        return Vec::new();
    };
    view.rows()
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            Some((
                i,
                Coordinate {
                    latitude: row[lat].as_f64()?,
                    longitude: row[lon].as_f64()?,
                },
            ))
        })
        .collect()
}
