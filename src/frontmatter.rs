//! Splits source files into their YAML front matter and body. A front matter
//! block is a `---` line, a YAML mapping, and a closing `---` line:
//!
//! ```md
//! ---
//! title: Hello, world!
//! tags: [greet]
//! ---
//! # Hello
//! ```
//!
//! Files without a well-formed block are treated as all body.

use serde_yaml::{Mapping, Value};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// The exact line that opens and closes a front matter block.
pub const DELIMITER: &str = "---\n";

/// Parsed front matter: an insertion-ordered mapping of metadata keys.
pub type FrontMatter = Mapping;

/// Splits `raw` into its front matter and body. If `raw` doesn't begin with
/// the delimiter line, or the block is never closed, the front matter is
/// empty and the body is all of `raw`.
pub fn parse(raw: &str) -> Result<(FrontMatter, &str)> {
    match split(raw) {
        None => Ok((Mapping::new(), raw)),
        Some((meta, body)) => Ok((deserialize(meta)?, body)),
    }
}

/// Returns the metadata region and body if `raw` contains a closed block.
fn split(raw: &str) -> Option<(&str, &str)> {
    if !raw.starts_with(DELIMITER) {
        return None;
    }

    // Search from the opening delimiter's own newline so that a closing
    // delimiter directly after it (an empty block) is found.
    let rest = &raw[DELIMITER.len() - 1..];
    let offset = rest.find("\n---\n")?;
    let meta_end = DELIMITER.len() - 1 + offset + 1;
    let body_start = meta_end + DELIMITER.len();
    Some((&raw[DELIMITER.len()..meta_end], &raw[body_start..]))
}

fn deserialize(meta: &str) -> Result<FrontMatter> {
    if is_blank_yaml(meta) {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(meta)? {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(Error::NotAMapping),
    }
}

/// Reports whether `text` holds no YAML content at all, only blank lines,
/// comments, and document markers. serde_yaml rejects such documents rather
/// than reading them as null.
pub fn is_blank_yaml(text: &str) -> bool {
    text.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

/// Cheaply checks whether the file at `path` begins with the delimiter line
/// by reading at most its first four bytes.
pub fn has_leading_delimiter(path: &Path) -> io::Result<bool> {
    let mut buf = [0u8; 4];
    let mut read = 0;
    let mut file = File::open(path)?;
    while read < buf.len() {
        match file.read(&mut buf[read..])? {
            0 => break,
            n => read += n,
        }
    }
    Ok(read == buf.len() && buf == DELIMITER.as_bytes())
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a front matter block.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the block isn't valid YAML.
    #[error("parsing front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Returned when the block is valid YAML but not a mapping.
    #[error("front matter must be a mapping")]
    NotAMapping,
}

#[cfg(test)]
mod test {
    use super::*;

    fn key(s: &str) -> Value {
        Value::String(s.to_owned())
    }

    #[test]
    fn test_no_front_matter() -> Result<()> {
        let raw = "# Hello\n\nWorld";
        let (front, body) = parse(raw)?;
        assert!(front.is_empty());
        assert_eq!(raw, body);
        Ok(())
    }

    #[test]
    fn test_front_matter() -> Result<()> {
        let (front, body) = parse("---\ntitle: Hi\ntags: [a, b]\n---\nBody\n")?;
        assert_eq!(Some(&key("Hi")), front.get(&key("title")));
        assert_eq!(
            Some(&Value::Sequence(vec![key("a"), key("b")])),
            front.get(&key("tags"))
        );
        assert_eq!("Body\n", body);
        Ok(())
    }

    #[test]
    fn test_empty_front_matter() -> Result<()> {
        let (front, body) = parse("---\n---\nBody")?;
        assert!(front.is_empty());
        assert_eq!("Body", body);
        Ok(())
    }

    #[test]
    fn test_comment_only_front_matter() -> Result<()> {
        let (front, body) = parse("---\n# draft\n\n  # later\n---\nBody")?;
        assert!(front.is_empty());
        assert_eq!("Body", body);
        Ok(())
    }

    #[test]
    fn test_is_blank_yaml() {
        assert!(is_blank_yaml(""));
        assert!(is_blank_yaml("\n  \n"));
        assert!(is_blank_yaml("# just a comment\n"));
        assert!(is_blank_yaml("---\n# only a marker\n...\n"));
        assert!(!is_blank_yaml("# comment\ntitle: Hi\n"));
        assert!(!is_blank_yaml("title: Hi # trailing\n"));
    }

    #[test]
    fn test_unclosed_front_matter() -> Result<()> {
        let raw = "---\ntitle: Hi\nBody";
        let (front, body) = parse(raw)?;
        assert!(front.is_empty());
        assert_eq!(raw, body);
        Ok(())
    }

    #[test]
    fn test_delimiter_must_be_whole_line() -> Result<()> {
        let raw = "----\ntitle: Hi\n---\nBody";
        let (front, body) = parse(raw)?;
        assert!(front.is_empty());
        assert_eq!(raw, body);
        Ok(())
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            parse("---\ntitle: [unclosed\n---\nBody"),
            Err(Error::Yaml(_))
        ));
    }

    #[test]
    fn test_not_a_mapping() {
        assert!(matches!(
            parse("---\n- a\n- b\n---\nBody"),
            Err(Error::NotAMapping)
        ));
    }

    #[test]
    fn test_has_leading_delimiter() -> io::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let cases = [
            ("front.md", "---\ntitle: Hi\n---\n", true),
            ("plain.md", "# Hi", false),
            ("short.md", "---", false),
            ("empty.md", "", false),
        ];
        for (name, contents, wanted) in cases.iter() {
            let path = dir.path().join(name);
            std::fs::write(&path, contents)?;
            assert_eq!(*wanted, has_leading_delimiter(&path)?, "{}", name);
        }
        Ok(())
    }
}
