// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! GPS decoding from EXIF metadata
//!
//! EXIF stores positions as degrees/minutes/seconds triples plus a one-letter
//! hemisphere reference per axis. This module turns a GPS block into signed
//! decimal degrees.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::metadata::{ExifTagMap, TagValue, GPS_INFO_TAG};
use crate::{Result, ScanError};

/// GPS block keyed by numeric GPS tag id
pub type GpsInfo = BTreeMap<u16, TagValue>;

pub const GPS_LATITUDE_REF: u16 = 1;
pub const GPS_LATITUDE: u16 = 2;
pub const GPS_LONGITUDE_REF: u16 = 3;
pub const GPS_LONGITUDE: u16 = 4;

/// Signed decimal latitude/longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Convert degrees/minutes/seconds to decimal degrees.
///
/// Southern and western references produce negative values.
pub fn decimal_from_dms(degrees: f64, minutes: f64, seconds: f64, reference: &str) -> f64 {
    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    if matches!(reference.trim(), "S" | "W") {
        -decimal
    } else {
        decimal
    }
}

/// Interpret an EXIF value as a (degrees, minutes, seconds) triple
pub fn dms_from_value(value: &TagValue) -> Result<(f64, f64, f64)> {
    let parts: Vec<f64> = match value {
        TagValue::Numbers(v) => v.clone(),
        TagValue::Integers(v) => v.iter().map(|&n| n as f64).collect(),
        other => {
            return Err(ScanError::Gps(format!("expected a DMS triple, found {}", other)));
        }
    };

    match parts.as_slice() {
        &[d, m, s] => Ok((d, m, s)),
        _ => Err(ScanError::Gps(format!(
            "expected 3 DMS components, found {}",
            parts.len()
        ))),
    }
}

fn reference_from_value(value: &TagValue) -> Result<&str> {
    match value {
        TagValue::Text(s) => Ok(s.as_str()),
        other => Err(ScanError::Gps(format!("expected a hemisphere reference, found {}", other))),
    }
}

/// Decode coordinates from a GPS block.
///
/// Returns `Ok(None)` when the block is absent or empty, or when any of the
/// four position fields is missing or empty.
pub fn coordinates_from_gps_info(gps_info: Option<&GpsInfo>) -> Result<Option<Coordinates>> {
    let info = match gps_info {
        Some(info) if !info.is_empty() => info,
        _ => return Ok(None),
    };

    let field = |key: u16| info.get(&key).filter(|v| !v.is_empty());

    let (lat_dms, lat_ref, lon_dms, lon_ref) = match (
        field(GPS_LATITUDE),
        field(GPS_LATITUDE_REF),
        field(GPS_LONGITUDE),
        field(GPS_LONGITUDE_REF),
    ) {
        (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
        _ => return Ok(None),
    };

    let (d, m, s) = dms_from_value(lat_dms)?;
    let latitude = decimal_from_dms(d, m, s, reference_from_value(lat_ref)?);
    let (d, m, s) = dms_from_value(lon_dms)?;
    let longitude = decimal_from_dms(d, m, s, reference_from_value(lon_ref)?);

    Ok(Some(Coordinates { latitude, longitude }))
}

/// Decode coordinates from the `GPSInfo` entry of a tag map
pub fn coordinates_from_tags(tags: &ExifTagMap) -> Result<Option<Coordinates>> {
    match tags.get(GPS_INFO_TAG) {
        None => Ok(None),
        Some(TagValue::Gps(info)) => coordinates_from_gps_info(Some(info)),
        Some(other) => Err(ScanError::Gps(format!("{} is not a GPS block: {}", GPS_INFO_TAG, other))),
    }
}
