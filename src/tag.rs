//! Defines the [`TagIndex`] type, which groups posts by the tags they declare.

use crate::document::Document;
use std::collections::BTreeMap;

/// Maps each tag to the posts carrying it. Tags are kept sorted; each bucket
/// keeps the order in which posts were collected.
#[derive(Debug, Default)]
pub struct TagIndex<'a> {
    tags: BTreeMap<String, Vec<&'a Document>>,
}

impl<'a> TagIndex<'a> {
    /// Indexes `posts` by their tags. Posts without tags appear in no bucket.
    pub fn new(posts: &'a [Document]) -> TagIndex<'a> {
        let mut tags: BTreeMap<String, Vec<&'a Document>> = BTreeMap::new();
        for post in posts {
            for tag in post.tags() {
                tags.entry(tag).or_insert_with(Vec::new).push(post);
            }
        }
        TagIndex { tags }
    }

    /// The posts tagged with `tag`, if any.
    pub fn get(&self, tag: &str) -> Option<&[&'a Document]> {
        self.tags.get(tag).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterates over tags and their posts in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[&'a Document])> {
        self.tags.iter().map(|(tag, posts)| (tag.as_str(), posts.as_slice()))
    }
}
