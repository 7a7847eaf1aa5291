//! Expands URL patterns such as `${year}/${name}.html` against a document's
//! fields.

use crate::document::scalar_to_string;
use serde_yaml::Value;

/// Replaces every `${field}` in `pattern` with the string form of that
/// field's value, substituting fields in order. Placeholders with no matching
/// field, or whose value has no string form, are left verbatim.
pub fn resolve<'a, I>(pattern: &str, fields: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut link = pattern.to_owned();
    for (name, value) in fields {
        let placeholder = format!("${{{}}}", name);
        if !link.contains(&placeholder) {
            continue;
        }
        if let Some(value) = scalar_to_string(value) {
            link = link.replace(&placeholder, &value);
        }
    }
    link
}
