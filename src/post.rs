//! Collects posts from the posts directory. A post's file name carries its
//! date and slug (`YYYY-M-D-<name>.md`); its contents are front matter and a
//! Markdown body. See [`Collector::collect_posts`].

use crate::config::Config;
use crate::document::{Document, Kind};
use crate::{frontmatter, markdown, url};
use chrono::NaiveDate;
use regex::Regex;
use std::fs::read_dir;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// The posts directory relative to the project root.
pub const POSTS_DIRECTORY: &str = "_posts";

static POST_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})-(.+)\.md$").unwrap()
});

/// The parts of a post file name.
#[derive(Clone, Debug, PartialEq)]
pub struct PostFileName {
    pub year: i32,
    pub month: u32,
    pub day: u32,

    /// The slug: everything between the day and the `.md` extension.
    pub name: String,
}

impl PostFileName {
    /// Parses a post file name, returning `None` for names that don't follow
    /// the `YYYY-M-D-<name>.md` convention.
    pub fn parse(file_name: &str) -> Option<PostFileName> {
        let captures = POST_FILE_NAME.captures(file_name)?;
        Some(PostFileName {
            year: captures[1].parse().ok()?,
            month: captures[2].parse().ok()?,
            day: captures[3].parse().ok()?,
            name: captures[4].to_owned(),
        })
    }

    /// The calendar date, if the numbers form one.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

/// Parses [`Document`] posts from source files.
pub struct Collector<'a> {
    /// Supplies the `postLink` pattern for post URLs.
    config: &'a Config,
}

impl<'a> Collector<'a> {
    pub fn new(config: &'a Config) -> Collector<'a> {
        Collector { config }
    }

    /// Reads every post in `posts_directory`. Entries whose names don't follow
    /// the post file name convention are skipped, as are directories. A missing
    /// directory yields no posts. Posts are returned in file name order, which
    /// is not necessarily chronological.
    pub fn collect_posts(&self, posts_directory: &Path) -> Result<Vec<Document>> {
        if !posts_directory.is_dir() {
            log::debug!(
                "No posts directory at '{}'",
                posts_directory.display()
            );
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for result in read_dir(posts_directory)? {
            let entry = result?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if let Some(parsed) = PostFileName::parse(&file_name) {
                entries.push((parsed, entry.path()));
            }
        }
        entries.sort_by(|a, b| a.1.cmp(&b.1));

        let mut posts = Vec::with_capacity(entries.len());
        for (file_name, path) in entries {
            posts.push(self.parse_post(&file_name, &path).map_err(|e| {
                Error::Annotated(path.clone(), Box::new(e))
            })?);
        }
        Ok(posts)
    }

    /// Reads and parses a single post. The URL is resolved last so the
    /// pattern can reference any front matter or derived field.
    pub fn parse_post(
        &self,
        file_name: &PostFileName,
        path: &Path,
    ) -> Result<Document> {
        let date = file_name.date().ok_or_else(|| Error::InvalidDate {
            year: file_name.year,
            month: file_name.month,
            day: file_name.day,
        })?;
        let contents = std::fs::read_to_string(path)?;
        let (front, body) = frontmatter::parse(&contents)?;

        let mut post = Document {
            front,
            content: markdown::to_html(body),
            name: file_name.name.clone(),
            url: String::new(),
            kind: Kind::Post { date },
        };
        let fields = post.fields();
        post.url = output_url(&url::resolve(
            &self.config.settings.post_link,
            fields.iter().map(|(k, v)| (k.as_str(), v)),
        ))?;
        Ok(post)
    }
}

/// Normalizes a resolved post URL into a path relative to the output root.
/// Leading slashes are dropped; parent components are rejected since they
/// would escape the output directory.
pub fn output_url(resolved: &str) -> Result<String> {
    let trimmed = resolved.trim_start_matches('/');
    let escapes = Path::new(trimmed)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if trimmed.is_empty() || escapes {
        return Err(Error::InvalidUrl(resolved.to_owned()));
    }
    Ok(trimmed.to_owned())
}

/// Represents the result of a post-collection operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error collecting posts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a post's file name numbers aren't a calendar date.
    #[error("invalid post date {year}-{month}-{day}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    /// Returned when a post's resolved URL is empty or escapes the output
    /// directory.
    #[error("invalid post URL `{0}`")]
    InvalidUrl(String),

    /// Returned when a post's front matter doesn't parse.
    #[error(transparent)]
    FrontMatter(#[from] frontmatter::Error),

    /// Returned for I/O errors reading the posts directory or a post.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An error annotated with the post it occurred in.
    #[error("parsing post '{}': {}", .0.display(), .1)]
    Annotated(PathBuf, #[source] Box<Error>),
}
