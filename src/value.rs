//! Conversions from YAML values and [`Document`]s into template [`Value`]s.

use crate::document::{format_date, scalar_to_string, Document, Kind};
use chrono::Datelike;
use gtmpl::Value;
use serde_yaml::Value as Yaml;
use std::collections::HashMap;

/// Converts a YAML value structurally. Mapping keys without a string form
/// are dropped.
pub fn from_yaml(yaml: &Yaml) -> Value {
    match yaml {
        Yaml::Null => Value::Nil,
        Yaml::Bool(b) => Value::from(*b),
        Yaml::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Value::from(i),
            (None, Some(u), _) => Value::from(u),
            (None, None, Some(f)) => Value::from(f),
            (None, None, None) => Value::String(n.to_string()),
        },
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(seq) => Value::Array(seq.iter().map(from_yaml).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .iter()
                .filter_map(|(k, v)| Some((scalar_to_string(k)?, from_yaml(v))))
                .collect(),
        ),
    }
}

impl From<&Document> for Value {
    /// Converts a [`Document`] into a [`Value::Object`] holding its front
    /// matter and derived fields. Derived fields win over front matter keys.
    fn from(doc: &Document) -> Value {
        let front = from_yaml(&Yaml::Mapping(doc.front.clone()));
        let mut m: HashMap<String, Value> = match front {
            Value::Object(m) => m,
            _ => HashMap::new(),
        };
        m.insert("content".to_owned(), Value::String(doc.content.clone()));
        m.insert("name".to_owned(), Value::String(doc.name.clone()));
        m.insert("url".to_owned(), Value::String(doc.url.clone()));
        if let Kind::Post { date } = doc.kind {
            m.insert("date".to_owned(), Value::String(format_date(date)));
            m.insert("year".to_owned(), Value::from(i64::from(date.year())));
            m.insert("month".to_owned(), Value::from(u64::from(date.month())));
            m.insert("day".to_owned(), Value::from(u64::from(date.day())));
        }
        Value::Object(m)
    }
}

/// Attaches a copy of `site` to a document value under the `site` key.
/// Values other than objects are left alone.
pub fn attach_site(value: &mut Value, site: &Value) {
    if let Value::Object(obj) = value {
        obj.insert("site".to_owned(), site.clone());
    }
}
