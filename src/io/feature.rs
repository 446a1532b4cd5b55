use anyhow::{anyhow, bail, Result};
use geo::{MultiPolygon, Point};
use serde_json::{Map, Value};
use shapefile::dbase::{FieldValue, Record};

/// Geometry of an input feature.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Geometry {
    Area(MultiPolygon<f64>),
    Point(Point<f64>),
}

/// A scalar attribute value, independent of the file format it came from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Attr {
    Text(String),
    Number(f64),
    Null,
}

/// Attribute table row, kept in its source representation.
#[derive(Debug, Clone)]
pub(crate) enum Properties {
    Dbf(Record),
    Json(Map<String, Value>),
}

impl Properties {
    /// Look up a field by exact name. `None` when the field does not exist.
    pub(crate) fn get(&self, field: &str) -> Option<Attr> {
        match self {
            Self::Dbf(record) => record.get(field).map(|value| match value {
                FieldValue::Character(Some(s)) | FieldValue::Memo(s) => Attr::Text(s.trim().to_string()),
                FieldValue::Numeric(Some(n)) | FieldValue::Double(n) | FieldValue::Currency(n) => Attr::Number(*n),
                FieldValue::Float(Some(n)) => Attr::Number(*n as f64),
                FieldValue::Integer(n) => Attr::Number(*n as f64),
                _ => Attr::Null,
            }),
            Self::Json(map) => map.get(field).map(|value| match value {
                Value::String(s) => Attr::Text(s.trim().to_string()),
                Value::Number(n) => n.as_f64().map_or(Attr::Null, Attr::Number),
                Value::Bool(b) => Attr::Text(b.to_string()),
                _ => Attr::Null,
            }),
        }
    }
}

/// One record of an input collection.
#[derive(Debug, Clone)]
pub(crate) struct Feature {
    pub geometry: Option<Geometry>,
    pub properties: Properties,
}

impl Feature {
    fn require(&self, field: &str) -> Result<Attr> {
        self.properties.get(field).ok_or_else(|| anyhow!("missing required field: {field}"))
    }

    /// Text value of a required field. Whole numbers are written without a fraction.
    pub(crate) fn text(&self, field: &str) -> Result<String> {
        match self.require(field)? {
            Attr::Text(s) if !s.is_empty() => Ok(s),
            Attr::Number(n) if n.fract() == 0.0 => Ok(format!("{}", n as i64)),
            Attr::Number(n) => Ok(n.to_string()),
            _ => bail!("empty value in field: {field}"),
        }
    }

    /// Text value of an optional field; missing and empty values give `None`.
    pub(crate) fn text_opt(&self, field: &str) -> Result<Option<String>> {
        match self.properties.get(field) {
            None | Some(Attr::Null) => Ok(None),
            Some(Attr::Text(s)) if s.is_empty() => Ok(None),
            Some(_) => self.text(field).map(Some),
        }
    }

    /// Numeric value of an optional field. Numeric-looking text is accepted.
    pub(crate) fn number_opt(&self, field: &str) -> Result<Option<f64>> {
        match self.properties.get(field) {
            None | Some(Attr::Null) => Ok(None),
            Some(Attr::Number(n)) => Ok(Some(n)),
            Some(Attr::Text(s)) if s.is_empty() => Ok(None),
            Some(Attr::Text(s)) => s.parse::<f64>()
                .map(Some)
                .map_err(|_| anyhow!("invalid numeric value {s:?} in field: {field}")),
        }
    }

    /// Non-negative count from a required field; null counts as zero.
    pub(crate) fn count(&self, field: &str) -> Result<u64> {
        self.require(field)?;
        self.count_opt(field)
    }

    /// Non-negative count from an optional field; missing or null counts as zero.
    pub(crate) fn count_opt(&self, field: &str) -> Result<u64> {
        match self.number_opt(field)? {
            None => Ok(0),
            Some(n) if n.is_finite() && n >= 0.0 => Ok(n.round() as u64),
            Some(n) => bail!("negative or non-finite count {n} in field: {field}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(properties: Value) -> Feature {
        let Value::Object(map) = properties else { panic!("properties must be an object") };
        Feature { geometry: None, properties: Properties::Json(map) }
    }

    #[test]
    fn text_accepts_numbers() {
        let f = feature(json!({ "cd_setor": 355030801000001u64, "cd_dist": " D1 " }));
        assert_eq!(f.text("cd_setor").unwrap(), "355030801000001");
        assert_eq!(f.text("cd_dist").unwrap(), "D1");
        assert!(f.text("missing").is_err());
    }

    #[test]
    fn counts_accept_numeric_text_and_null() {
        let f = feature(json!({ "a": "42", "b": 7.0, "c": null, "d": -1, "e": "x" }));
        assert_eq!(f.count("a").unwrap(), 42);
        assert_eq!(f.count("b").unwrap(), 7);
        assert_eq!(f.count("c").unwrap(), 0);
        assert!(f.count("d").is_err());
        assert!(f.count("e").is_err());
        assert!(f.count("missing").is_err());
        assert_eq!(f.count_opt("missing").unwrap(), 0);
    }

    #[test]
    fn dbf_values_are_read() {
        let mut record = Record::default();
        record.insert("cd_dist".to_string(), FieldValue::Character(Some("D2  ".to_string())));
        record.insert("num_dom".to_string(), FieldValue::Numeric(Some(12.0)));
        record.insert("num_cad".to_string(), FieldValue::Numeric(None));
        let f = Feature { geometry: None, properties: Properties::Dbf(record) };

        assert_eq!(f.text("cd_dist").unwrap(), "D2");
        assert_eq!(f.count("num_dom").unwrap(), 12);
        assert_eq!(f.count("num_cad").unwrap(), 0);
        assert_eq!(f.text_opt("num_cad").unwrap(), None);
    }
}
