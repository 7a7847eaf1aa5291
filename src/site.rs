//! Defines [`Site`], the build-wide context every template can reach as
//! `site`: the configuration, the post collection, and the tag index.

use crate::config::Config;
use crate::document::Document;
use crate::post::{Collector, POSTS_DIRECTORY};
use crate::tag::TagIndex;
use crate::value::from_yaml;
use gtmpl::Value;
use serde_yaml::Value as Yaml;
use std::collections::HashMap;
use std::path::Path;

/// The configuration and posts for one build.
pub struct Site {
    pub config: Config,

    /// Posts in collection order.
    pub posts: Vec<Document>,
}

impl Site {
    /// Loads the configuration and collects the posts under `project_root`.
    pub fn load(project_root: &Path) -> crate::build::Result<Site> {
        let config = Config::from_directory(project_root)?;
        log::info!(
            "Loaded configuration (postLink = `{}`)",
            config.settings.post_link
        );

        let posts = Collector::new(&config)
            .collect_posts(&project_root.join(POSTS_DIRECTORY))?;
        log::info!("Collected {} posts", posts.len());
        Ok(Site { config, posts })
    }

    /// Indexes the posts by tag.
    pub fn tags(&self) -> TagIndex<'_> {
        TagIndex::new(&self.posts)
    }

    /// Converts the site into the `site` template value: an object with
    /// `config`, `posts`, and `tags` fields.
    pub fn to_value(&self) -> Value {
        let posts: Vec<Value> = self.posts.iter().map(Value::from).collect();
        let tags: HashMap<String, Value> = self
            .tags()
            .iter()
            .map(|(tag, posts)| {
                (
                    tag.to_owned(),
                    Value::Array(posts.iter().map(|p| Value::from(*p)).collect()),
                )
            })
            .collect();

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "config".to_owned(),
            from_yaml(&Yaml::Mapping(self.config.values.clone())),
        );
        m.insert("posts".to_owned(), Value::Array(posts));
        m.insert("tags".to_owned(), Value::Object(tags));
        Value::Object(m)
    }
}
