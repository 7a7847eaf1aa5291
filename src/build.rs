//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output site: loading the configuration and posts
//! ([`crate::site`]), preparing layouts ([`crate::layout`]), cleaning the
//! output directory, rendering posts, and walking the project tree to render
//! pages and copy everything else.

use crate::config::Error as ConfigError;
use crate::document::{Document, Kind};
use crate::frontmatter::{self, Error as FrontMatterError};
use crate::layout::{
    Error as LayoutError, LayoutRegistry, INCLUDES_DIRECTORY, LAYOUTS_DIRECTORY,
};
use crate::markdown;
use crate::post::Error as PostError;
use crate::site::Site;
use gtmpl::Value;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The output directory relative to the project root.
pub const OUTPUT_DIRECTORY: &str = "_site";

/// Names starting with this are never treated as content.
pub const RESERVED_PREFIX: char = '_';

/// The layout for posts that don't name one.
pub const DEFAULT_POST_LAYOUT: &str = "post.html";

/// The layout for pages that don't name one.
pub const DEFAULT_PAGE_LAYOUT: &str = "default.html";

const MARKDOWN_EXTENSION: &str = "md";

/// Builds the site rooted at `project_root` into `{project_root}/_site`. The
/// output directory is deleted and regenerated from scratch; any error aborts
/// the build and may leave it partially written.
pub fn build_site(project_root: &Path) -> Result<()> {
    let site = Site::load(project_root)?;
    let site_value = site.to_value();

    let mut layouts =
        LayoutRegistry::new(&project_root.join(LAYOUTS_DIRECTORY));
    layouts.prepare_includes(&project_root.join(INCLUDES_DIRECTORY))?;

    let output_directory = project_root.join(OUTPUT_DIRECTORY);
    rmdir(&output_directory)?;

    let mut renderer = Renderer {
        layouts,
        site: &site_value,
        output_directory: &output_directory,
    };
    for post in &site.posts {
        let file_path = output_directory.join(&post.url);
        renderer.write_document(post, DEFAULT_POST_LAYOUT, &file_path)?;
    }

    let mut pages = 0;
    let mut copied = 0;
    for result in WalkDir::new(project_root)
        .follow_links(true)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_reserved(e.file_name()))
    {
        let entry = result?;
        if entry.file_type().is_dir() {
            continue;
        }
        // strip_prefix shouldn't fail since the walk starts at `project_root`
        let relative = entry
            .path()
            .strip_prefix(project_root)
            .map_err(|_| Error::Io {
                path: entry.path().to_owned(),
                err: std::io::Error::other("outside the project root"),
            })?;
        if renderer.write_entry(entry.path(), relative)? {
            pages += 1;
        } else {
            copied += 1;
        }
    }

    log::info!(
        "Built {} posts and {} pages, copied {} files into '{}'",
        site.posts.len(),
        pages,
        copied,
        output_directory.display()
    );
    Ok(())
}

/// Reports whether a file or directory name is reserved for the build itself
/// (posts, layouts, includes, configuration, output).
pub fn is_reserved(file_name: &OsStr) -> bool {
    file_name.to_string_lossy().starts_with(RESERVED_PREFIX)
}

/// Renders documents through their layouts and writes the output files.
struct Renderer<'a> {
    layouts: LayoutRegistry,

    /// The `site` value, attached to documents whose layout reads it.
    site: &'a Value,

    output_directory: &'a Path,
}

impl Renderer<'_> {
    /// Renders `doc` with its own layout, or `default_layout` if it doesn't
    /// name one, and writes the result to `file_path`.
    fn write_document(
        &mut self,
        doc: &Document,
        default_layout: &str,
        file_path: &Path,
    ) -> Result<()> {
        let layout = doc.layout().unwrap_or(default_layout);
        let rendered =
            self.layouts
                .render_with_site(layout, Value::from(doc), self.site)?;
        ensure_parent(file_path)?;
        std::fs::write(file_path, rendered).map_err(|err| Error::Io {
            path: file_path.to_owned(),
            err,
        })?;
        log::debug!("Rendered '{}' with `{}`", file_path.display(), layout);
        Ok(())
    }

    /// Renders the file at `path` if it is a Markdown file with front matter,
    /// otherwise copies it verbatim. `relative` is its path from the project
    /// root, mirrored under the output directory. Returns whether the file was
    /// rendered.
    fn write_entry(&mut self, path: &Path, relative: &Path) -> Result<bool> {
        let out = self.output_directory.join(relative);
        if !is_page(path)? {
            ensure_parent(&out)?;
            std::fs::copy(path, &out).map_err(|err| Error::Io {
                path: path.to_owned(),
                err,
            })?;
            log::debug!("Copied '{}'", relative.display());
            return Ok(false);
        }

        let contents = std::fs::read_to_string(path).map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?;
        let (front, body) = frontmatter::parse(&contents).map_err(|err| {
            Error::Page {
                path: path.to_owned(),
                err,
            }
        })?;
        let doc = Document {
            front,
            content: markdown::to_html(body),
            name: page_name(relative),
            url: page_url(relative),
            kind: Kind::Page,
        };
        self.write_document(&doc, DEFAULT_PAGE_LAYOUT, &out)?;
        Ok(true)
    }
}

/// A page is a Markdown file that begins with a front matter delimiter.
fn is_page(path: &Path) -> Result<bool> {
    if path.extension() != Some(OsStr::new(MARKDOWN_EXTENSION)) {
        return Ok(false);
    }
    frontmatter::has_leading_delimiter(path).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })
}

/// The page's file name less its final extension.
fn page_name(relative: &Path) -> String {
    relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The page's path from the project root with `/` separators.
fn page_url(relative: &Path) -> String {
    relative
        .iter()
        .map(|c| c.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn ensure_parent(file_path: &Path) -> Result<()> {
    match file_path.parent() {
        Some(dir) => std::fs::create_dir_all(dir).map_err(|err| Error::Io {
            path: dir.to_owned(),
            err,
        }),
        None => Ok(()),
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {
            log::info!("Cleaned '{}'", dir.display());
            Ok(())
        }
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Every error is fatal to the build.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for errors loading `_config.yml`.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Returned for errors collecting posts.
    #[error(transparent)]
    Post(#[from] PostError),

    /// Returned for errors loading or rendering layouts.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Returned when a page's front matter doesn't parse.
    #[error("parsing page '{}': {err}", path.display())]
    Page {
        path: PathBuf,
        #[source]
        err: FrontMatterError,
    },

    /// Returned for I/O problems while cleaning the output directory.
    #[error("cleaning directory '{}': {err}", path.display())]
    Clean {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for I/O problems reading, writing, or copying a file.
    #[error("'{}': {err}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for errors walking the project tree.
    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Other(#[from] std::io::Error),
}
