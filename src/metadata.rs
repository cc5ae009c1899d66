// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! EXIF metadata reader

use exif::{Context, In, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, trace};

use crate::gps::{self, Coordinates, GpsInfo};
use crate::Result;

/// Tag name under which the nested GPS block is stored
pub const GPS_INFO_TAG: &str = "GPSInfo";

/// Notice shown for images without EXIF data
pub const NO_METADATA: &str = "No EXIF metadata found";

/// EXIF tags keyed by human-readable name
pub type ExifTagMap = BTreeMap<String, TagValue>;

/// A single EXIF value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    Text(String),
    Integers(Vec<i64>),
    Numbers(Vec<f64>),
    Bytes(Vec<u8>),
    Gps(GpsInfo),
}

impl TagValue {
    /// Empty strings, lists and blocks count as missing
    pub fn is_empty(&self) -> bool {
        match self {
            TagValue::Text(s) => s.is_empty(),
            TagValue::Integers(v) => v.is_empty(),
            TagValue::Numbers(v) => v.is_empty(),
            TagValue::Bytes(v) => v.is_empty(),
            TagValue::Gps(info) => info.is_empty(),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    if let [single] = items {
        return write!(f, "{}", single);
    }
    write!(f, "(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, ")")
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Text(s) => write!(f, "{}", s),
            TagValue::Integers(v) => write_list(f, v),
            TagValue::Numbers(v) => write_list(f, v),
            TagValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            TagValue::Gps(info) => {
                write!(f, "{{")?;
                for (i, (key, value)) in info.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&Value> for TagValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Ascii(parts) => TagValue::Text(
                parts
                    .iter()
                    .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').to_string())
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Value::Byte(v) => TagValue::Integers(v.iter().map(|&n| n as i64).collect()),
            Value::Short(v) => TagValue::Integers(v.iter().map(|&n| n as i64).collect()),
            Value::Long(v) => TagValue::Integers(v.iter().map(|&n| n as i64).collect()),
            Value::SByte(v) => TagValue::Integers(v.iter().map(|&n| n as i64).collect()),
            Value::SShort(v) => TagValue::Integers(v.iter().map(|&n| n as i64).collect()),
            Value::SLong(v) => TagValue::Integers(v.iter().map(|&n| n as i64).collect()),
            Value::Rational(v) => TagValue::Numbers(v.iter().map(|r| r.to_f64()).collect()),
            Value::SRational(v) => TagValue::Numbers(v.iter().map(|r| r.to_f64()).collect()),
            Value::Float(v) => TagValue::Numbers(v.iter().map(|&n| n as f64).collect()),
            Value::Double(v) => TagValue::Numbers(v.clone()),
            Value::Undefined(bytes, _) => TagValue::Bytes(bytes.clone()),
            Value::Unknown(..) => TagValue::Bytes(Vec::new()),
        }
    }
}

/// Result of reading an image's metadata
#[derive(Debug, Clone, PartialEq)]
pub enum ExifMetadata {
    Tags(ExifTagMap),
    NoMetadata,
}

/// Read the EXIF tags of an image.
///
/// A container without an EXIF block yields [`ExifMetadata::NoMetadata`];
/// unreadable files and invalid containers are errors.
pub fn read_exif(path: &Path) -> Result<ExifMetadata> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(container)) => {
            debug!("No EXIF block in {} container {:?}", container, path);
            return Ok(ExifMetadata::NoMetadata);
        }
        Err(e) => return Err(e.into()),
    };

    Ok(tag_map_from_exif(&exif))
}

/// Rename primary-image fields to their tag names and gather GPS fields
/// into a nested block under [`GPS_INFO_TAG`].
pub fn tag_map_from_exif(exif: &exif::Exif) -> ExifMetadata {
    let mut tags = ExifTagMap::new();
    let mut gps_info = GpsInfo::new();

    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        let value = TagValue::from(&field.value);
        trace!("EXIF field {}: {}", field.tag, value);
        if field.tag.context() == Context::Gps {
            gps_info.insert(field.tag.number(), value);
        } else {
            tags.insert(field.tag.to_string(), value);
        }
    }

    if !gps_info.is_empty() {
        tags.insert(GPS_INFO_TAG.to_string(), TagValue::Gps(gps_info));
    }

    if tags.is_empty() {
        ExifMetadata::NoMetadata
    } else {
        ExifMetadata::Tags(tags)
    }
}

/// GPS position of an image, if its metadata carries a complete one
pub fn coordinates_for_image(path: &Path) -> Result<Option<Coordinates>> {
    match read_exif(path)? {
        ExifMetadata::Tags(tags) => gps::coordinates_from_tags(&tags),
        ExifMetadata::NoMetadata => Ok(None),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use exif::experimental::Writer;
    use exif::{Field, Rational, Tag};
    use std::io::Cursor;

    fn rationals(parts: [u32; 3]) -> Value {
        Value::Rational(parts.iter().map(|&n| Rational { num: n, denom: 1 }).collect())
    }

    fn ascii(s: &str) -> Value {
        Value::Ascii(vec![s.as_bytes().to_vec()])
    }

    /// Minimal JPEG stream holding only an APP1 EXIF segment
    pub(crate) fn jpeg_with_gps(lat: [u32; 3], lat_ref: &str, lon: [u32; 3], lon_ref: &str) -> Vec<u8> {
        let fields = vec![
            Field { tag: Tag::Make, ifd_num: In::PRIMARY, value: ascii("DJI") },
            Field { tag: Tag::GPSLatitudeRef, ifd_num: In::PRIMARY, value: ascii(lat_ref) },
            Field { tag: Tag::GPSLatitude, ifd_num: In::PRIMARY, value: rationals(lat) },
            Field { tag: Tag::GPSLongitudeRef, ifd_num: In::PRIMARY, value: ascii(lon_ref) },
            Field { tag: Tag::GPSLongitude, ifd_num: In::PRIMARY, value: rationals(lon) },
        ];

        let mut writer = Writer::new();
        for field in &fields {
            writer.push_field(field);
        }
        let mut tiff = Cursor::new(Vec::new());
        writer.write(&mut tiff, false).unwrap();
        let tiff = tiff.into_inner();

        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(&tiff);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    /// PNG bytes without an eXIf chunk, whatever the file extension
    pub(crate) fn write_plain_image(path: &Path) {
        image::RgbImage::new(8, 8)
            .save_with_format(path, image::ImageFormat::Png)
            .unwrap();
    }

    #[test]
    fn test_png_without_exif_is_no_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.png");
        write_plain_image(&path);

        assert_eq!(read_exif(&path).unwrap(), ExifMetadata::NoMetadata);
        assert_eq!(coordinates_for_image(&path).unwrap(), None);
    }

    #[test]
    fn test_gps_from_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DJI_0317_T.JPG");
        std::fs::write(&path, jpeg_with_gps([10, 30, 0], "N", [20, 15, 0], "W")).unwrap();

        let tags = match read_exif(&path).unwrap() {
            ExifMetadata::Tags(tags) => tags,
            ExifMetadata::NoMetadata => panic!("Expected EXIF tags"),
        };
        assert_eq!(tags.get("Make"), Some(&TagValue::Text("DJI".to_string())));
        match tags.get(GPS_INFO_TAG) {
            Some(TagValue::Gps(info)) => {
                assert_eq!(info.get(&gps::GPS_LATITUDE_REF), Some(&TagValue::Text("N".to_string())));
                assert_eq!(info.get(&gps::GPS_LATITUDE), Some(&TagValue::Numbers(vec![10.0, 30.0, 0.0])));
            }
            other => panic!("Expected GPS block, got {:?}", other),
        }

        let coords = coordinates_for_image(&path).unwrap().unwrap();
        assert_eq!(coords.latitude, 10.5);
        assert_eq!(coords.longitude, -20.25);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_exif(&dir.path().join("missing.jpg"));
        assert!(matches!(result, Err(crate::ScanError::FileSystem(_))));
    }

    #[test]
    fn test_not_an_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, "plain text, not an image").unwrap();
        assert!(matches!(read_exif(&path), Err(crate::ScanError::Exif(_))));
    }

    #[test]
    fn test_tag_value_display() {
        assert_eq!(TagValue::Numbers(vec![10.0, 30.5, 0.0]).to_string(), "(10, 30.5, 0)");
        assert_eq!(TagValue::Integers(vec![640]).to_string(), "640");
        assert_eq!(TagValue::Bytes(vec![0, 1, 2]).to_string(), "<3 bytes>");

        let mut info = GpsInfo::new();
        info.insert(1, TagValue::Text("N".to_string()));
        assert_eq!(TagValue::Gps(info).to_string(), "{1: N}");
    }
}
