//! PASCAL VOC annotation parsing.
//!
//! Parsing happens in two steps: the XML is deserialized into the loose
//! [`VocAnnotation`] shape, then validated into an [`AnnotationRecord`]
//! whose dimensions are positive. Box problems are attached to their object
//! and only reported once the object's class is known to be converted.

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{BoxError, RecordError};
use crate::types::{
    AnnotationRecord, BoundingBox, ObjectInstance, VocAnnotation, VocBndBox, VocObject, VocSize,
};

/// Deserialize a VOC document without validating it.
pub fn parse_voc_str(xml: &str) -> Result<VocAnnotation, RecordError> {
    serde_xml_rs::from_str(xml).map_err(|e| RecordError::Xml(e.to_string()))
}

pub fn read_voc_file(path: &Path) -> Result<VocAnnotation, RecordError> {
    let content = fs::read_to_string(path)?;
    parse_voc_str(&content)
}

/// Parse and validate one annotation record from XML text.
pub fn parse_annotation_str(xml: &str) -> Result<AnnotationRecord, RecordError> {
    AnnotationRecord::try_from(parse_voc_str(xml)?)
}

/// Parse and validate one annotation record from a file.
pub fn parse_annotation_file(path: &Path) -> Result<AnnotationRecord, RecordError> {
    AnnotationRecord::try_from(read_voc_file(path)?)
}

// `<object>` elements may be interleaved with other children, so every
// occurrence is collected instead of relying on a derived `Vec` field.
impl<'de> Deserialize<'de> for VocAnnotation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VocAnnotationVisitor;

        impl<'de> Visitor<'de> for VocAnnotationVisitor {
            type Value = VocAnnotation;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a VOC annotation element")
            }

            fn visit_map<V>(self, mut map: V) -> Result<VocAnnotation, V::Error>
            where
                V: MapAccess<'de>,
            {
                let mut filename = None;
                let mut size = None;
                let mut objects = Vec::new();

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "filename" => {
                            filename = Some(map.next_value::<String>()?);
                        }
                        "size" => {
                            size = Some(map.next_value::<VocSize>()?);
                        }
                        "object" => {
                            objects.push(map.next_value::<VocObject>()?);
                        }
                        _ => {
                            map.next_value::<de::IgnoredAny>()?;
                        }
                    }
                }

                Ok(VocAnnotation {
                    filename,
                    size,
                    objects,
                })
            }
        }

        const FIELDS: &[&str] = &["filename", "size", "object"];
        deserializer.deserialize_struct("annotation", FIELDS, VocAnnotationVisitor)
    }
}

impl TryFrom<VocAnnotation> for AnnotationRecord {
    type Error = RecordError;

    fn try_from(doc: VocAnnotation) -> Result<Self, Self::Error> {
        let size = doc.size.ok_or(RecordError::MissingSize)?;
        let width: u32 = parse_field(size.width.as_deref(), "width")?;
        let height: u32 = parse_field(size.height.as_deref(), "height")?;
        if width == 0 || height == 0 {
            return Err(RecordError::ZeroDimension { width, height });
        }

        let objects = doc
            .objects
            .into_iter()
            .map(|object| {
                let class_name = object
                    .name
                    .map(|name| name.trim().to_string())
                    .ok_or(RecordError::MissingField { field: "name" })?;
                let bbox = object
                    .bndbox
                    .ok_or(BoxError::MissingField { field: "bndbox" })
                    .and_then(|bndbox| parse_bndbox(&bndbox));
                Ok::<_, RecordError>(ObjectInstance { class_name, bbox })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AnnotationRecord {
            width,
            height,
            objects,
        })
    }
}

fn parse_bndbox(bndbox: &VocBndBox) -> Result<BoundingBox, BoxError> {
    let bbox = BoundingBox {
        xmin: parse_coordinate(bndbox.xmin.as_deref(), "xmin")?,
        ymin: parse_coordinate(bndbox.ymin.as_deref(), "ymin")?,
        xmax: parse_coordinate(bndbox.xmax.as_deref(), "xmax")?,
        ymax: parse_coordinate(bndbox.ymax.as_deref(), "ymax")?,
    };

    // NaN coordinates fail these comparisons as well
    if !(bbox.xmin < bbox.xmax && bbox.ymin < bbox.ymax) {
        return Err(BoxError::Inverted {
            xmin: bbox.xmin,
            ymin: bbox.ymin,
            xmax: bbox.xmax,
            ymax: bbox.ymax,
        });
    }
    Ok(bbox)
}

fn parse_coordinate(value: Option<&str>, field: &'static str) -> Result<f64, BoxError> {
    parse_field(value, field).map_err(|e| match e {
        RecordError::MalformedNumber { field, value } => BoxError::MalformedNumber { field, value },
        _ => BoxError::MissingField { field },
    })
}

fn parse_field<T: std::str::FromStr>(
    value: Option<&str>,
    field: &'static str,
) -> Result<T, RecordError> {
    let value = value.ok_or(RecordError::MissingField { field })?;
    value
        .trim()
        .parse()
        .map_err(|_| RecordError::MalformedNumber {
            field,
            value: value.to_string(),
        })
}
