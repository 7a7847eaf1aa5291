//! Defines the [`Document`] type, the in-memory form of a rendered post or
//! page: its front matter plus the fields the build derives for it.

use crate::frontmatter::FrontMatter;
use chrono::{Datelike, NaiveDate};
use serde_yaml::Value;

/// The post- or page-specific part of a [`Document`].
#[derive(Clone, Debug, PartialEq)]
pub enum Kind {
    /// A post from the posts directory, dated by its file name.
    Post { date: NaiveDate },

    /// Any other content file with front matter.
    Page,
}

/// A post or page. The front matter is carried verbatim; derived fields
/// shadow front matter keys of the same name.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// The document's front matter, in file order.
    pub front: FrontMatter,

    /// The body, rendered to HTML.
    pub content: String,

    /// The post slug, or the page's file name less its extension.
    pub name: String,

    /// The output path relative to the output root.
    pub url: String,

    pub kind: Kind,
}

impl Document {
    /// Looks up a front matter key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.front.get(&Value::String(key.to_owned()))
    }

    /// The layout named by the `layout` key, if it's a string.
    pub fn layout(&self) -> Option<&str> {
        match self.get("layout") {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The post date, if this is a post.
    pub fn date(&self) -> Option<NaiveDate> {
        match self.kind {
            Kind::Post { date } => Some(date),
            Kind::Page => None,
        }
    }

    /// The document's tags. `tags` may be a sequence or a single scalar;
    /// duplicates are dropped and other shapes carry no tags. A null,
    /// `false`, or empty `tags` means no tags, and null or empty entries in a
    /// sequence are skipped.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        let mut push = |v: &Value| match v {
            Value::Null | Value::Sequence(_) | Value::Mapping(_) => {}
            _ => {
                if let Some(tag) = scalar_to_string(v) {
                    if !tag.is_empty() && !tags.contains(&tag) {
                        tags.push(tag);
                    }
                }
            }
        };
        match self.get("tags") {
            Some(Value::Sequence(seq)) => seq.iter().for_each(&mut push),
            Some(Value::Bool(false)) | None => {}
            Some(v) => push(v),
        }
        tags
    }

    /// The fields available to URL patterns, in substitution order: front
    /// matter keys first, then the derived fields. `url` is excluded since it
    /// is what the pattern produces.
    pub fn fields(&self) -> Vec<(String, Value)> {
        let mut fields: Vec<(String, Value)> = Vec::new();
        let mut set = |key: &str, value: Value| {
            match fields.iter_mut().find(|(k, _)| k == key) {
                Some(field) => field.1 = value,
                None => fields.push((key.to_owned(), value)),
            }
        };

        for (key, value) in self.front.iter() {
            if let Some(key) = scalar_to_string(key) {
                set(&key, value.clone());
            }
        }
        if let Some(date) = self.date() {
            set("date", Value::String(format_date(date)));
            set("year", Value::Number(i64::from(date.year()).into()));
            set("month", Value::Number(u64::from(date.month()).into()));
            set("day", Value::Number(u64::from(date.day()).into()));
        }
        set("content", Value::String(self.content.clone()));
        set("name", Value::String(self.name.clone()));
        fields
    }
}

/// Formats a post date the way it's exposed to templates and URL patterns.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Converts scalar YAML values to strings. Sequences are joined with commas;
/// mappings have no string form.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("null".to_owned()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(seq) => Some(
            seq.iter()
                .map(|v| scalar_to_string(v).unwrap_or_default())
                .collect::<Vec<String>>()
                .join(","),
        ),
        Value::Mapping(_) => None,
    }
}
