//! Loads and caches layouts, the named templates that wrap rendered documents,
//! along with the include partials every layout can reference.
//!
//! Includes are registered as Go template definitions, so a layout renders an
//! include `_includes/header.html` with `{{template "header" .}}`.

use crate::value::attach_site;
use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::fs::read_dir;
use std::path::{Component, Path, PathBuf};

/// The layouts directory relative to the project root.
pub const LAYOUTS_DIRECTORY: &str = "_layouts";

/// The includes directory relative to the project root.
pub const INCLUDES_DIRECTORY: &str = "_includes";

const LAYOUT_EXTENSION: &str = ".html";

/// A compiled layout. `references_site` records whether the layout or any
/// include mentions `site`, so documents rendered with it only carry the
/// site value when it can be read.
struct Layout {
    template: Template,
    references_site: bool,
}

/// Compiles layouts on first use and hands out the cached [`Template`] on
/// every later request for the same name.
pub struct LayoutRegistry {
    layouts_directory: PathBuf,

    /// Template definitions for every include, prepended to each layout's
    /// source before parsing.
    includes: String,

    layouts: HashMap<String, Layout>,
}

impl LayoutRegistry {
    pub fn new(layouts_directory: &Path) -> LayoutRegistry {
        LayoutRegistry {
            layouts_directory: layouts_directory.to_owned(),
            includes: String::new(),
            layouts: HashMap::new(),
        }
    }

    /// Registers every file in `includes_directory` as a partial named after
    /// the file with its final extension removed. Does nothing if the
    /// directory doesn't exist. Layouts compiled before this call don't see
    /// the includes.
    pub fn prepare_includes(&mut self, includes_directory: &Path) -> Result<()> {
        if !includes_directory.is_dir() {
            return Ok(());
        }

        let read_err = |err| Error::ReadInclude {
            path: includes_directory.to_owned(),
            err,
        };
        let mut entries = Vec::new();
        for result in read_dir(includes_directory).map_err(read_err)? {
            let entry = result.map_err(read_err)?;
            if entry.file_type().map_err(read_err)?.is_file() {
                entries.push(entry.path());
            }
        }
        entries.sort();

        for path in entries {
            let name = include_name(&path);
            let source = std::fs::read_to_string(&path).map_err(|err| {
                Error::ReadInclude {
                    path: path.clone(),
                    err,
                }
            })?;

            // Parse on its own first so a broken include is reported against
            // its own file rather than every layout.
            Template::default()
                .parse(&source)
                .map_err(|err| Error::ParseTemplate { path: path.clone(), err })?;

            log::debug!("Registered include `{}`", name);
            self.includes
                .push_str(&format!("{{{{define \"{}\"}}}}{}{{{{end}}}}", name, source));
        }
        Ok(())
    }

    /// Returns the layout called `name`, compiling `_layouts/<name>.html` on
    /// the first request. A name that already ends in `.html` is used as the
    /// file name directly.
    pub fn get_layout(&mut self, name: &str) -> Result<&Template> {
        Ok(&self.layout(name)?.template)
    }

    /// Reports whether the layout called `name`, with the includes, mentions
    /// `site` anywhere in its source. Compiles the layout if needed.
    pub fn references_site(&mut self, name: &str) -> Result<bool> {
        Ok(self.layout(name)?.references_site)
    }

    /// Renders `value` with the layout called `name`.
    pub fn render(&mut self, name: &str, value: Value) -> Result<String> {
        let template = self.get_layout(name)?;
        let context = Context::from(value).map_err(Error::Render)?;
        let mut out: Vec<u8> = Vec::new();
        template.execute(&mut out, &context).map_err(Error::Render)?;
        String::from_utf8(out).map_err(|e| Error::Render(e.to_string()))
    }

    /// Renders a document `value` with the layout called `name`, attaching
    /// `site` under the `site` key when the layout can reach it.
    pub fn render_with_site(
        &mut self,
        name: &str,
        mut value: Value,
        site: &Value,
    ) -> Result<String> {
        if self.references_site(name)? {
            attach_site(&mut value, site);
        }
        self.render(name, value)
    }

    /// The number of layouts compiled so far.
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    fn layout(&mut self, name: &str) -> Result<&Layout> {
        if !self.layouts.contains_key(name) {
            let layout = self.compile(name)?;
            self.layouts.insert(name.to_owned(), layout);
        }
        // just inserted if it wasn't already present
        self.layouts
            .get(name)
            .ok_or_else(|| Error::MissingLayout(name.to_owned()))
    }

    fn compile(&self, name: &str) -> Result<Layout> {
        let path = self.layout_path(name)?;
        let source = std::fs::read_to_string(&path).map_err(|err| {
            Error::ReadLayout {
                path: path.clone(),
                err,
            }
        })?;

        let mut contents = String::with_capacity(self.includes.len() + source.len());
        contents.push_str(&self.includes);
        contents.push_str(&source);

        let mut template = Template::default();
        template
            .parse(&contents)
            .map_err(|err| Error::ParseTemplate { path: path.clone(), err })?;
        log::debug!("Compiled layout '{}'", path.display());
        Ok(Layout {
            template,
            references_site: contents.contains("site"),
        })
    }

    /// The file for the layout called `name`. Names are paths relative to the
    /// layouts directory and may not leave it.
    fn layout_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes {
            return Err(Error::InvalidLayoutName(name.to_owned()));
        }
        Ok(if name.ends_with(LAYOUT_EXTENSION) {
            self.layouts_directory.join(relative)
        } else {
            self.layouts_directory
                .join(format!("{}{}", name, LAYOUT_EXTENSION))
        })
    }
}

/// The include name for a file: its file name less the final extension.
fn include_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.rfind('.') {
        Some(i) if i > 0 => file_name[..i].to_owned(),
        _ => file_name,
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or rendering a layout.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a layout file can't be read, typically because a
    /// document names a layout that doesn't exist.
    #[error("reading layout '{}': {err}", path.display())]
    ReadLayout {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when an include file or the includes directory can't be read.
    #[error("reading include '{}': {err}", path.display())]
    ReadInclude {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when a layout or include isn't a valid template.
    #[error("parsing template '{}': {err}", path.display())]
    ParseTemplate { path: PathBuf, err: String },

    /// Returned when a layout name is empty or points outside the layouts
    /// directory.
    #[error("invalid layout name `{0}`")]
    InvalidLayoutName(String),

    /// Returned when a compiled layout is missing from the cache.
    #[error("layout `{0}` is not loaded")]
    MissingLayout(String),

    /// Returned when executing a template fails.
    #[error("rendering template: {0}")]
    Render(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(LAYOUTS_DIRECTORY)).unwrap();
        dir
    }

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn doc(content: &str) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("content".to_owned(), Value::String(content.to_owned()));
        Value::Object(m)
    }

    #[test]
    fn test_render() -> Result<()> {
        let dir = project();
        let layouts = dir.path().join(LAYOUTS_DIRECTORY);
        write(&layouts, "post.html", "<main>{{.content}}</main>");
        let mut registry = LayoutRegistry::new(&layouts);
        assert_eq!(
            "<main><p>Hi</p></main>",
            registry.render("post.html", doc("<p>Hi</p>"))?
        );
        Ok(())
    }

    #[test]
    fn test_cache_hit_skips_file() -> Result<()> {
        let dir = project();
        let layouts = dir.path().join(LAYOUTS_DIRECTORY);
        write(&layouts, "post.html", "[{{.content}}]");
        let mut registry = LayoutRegistry::new(&layouts);
        let first = registry.render("post", doc("a"))?;

        // A cache hit must not touch the file system.
        std::fs::remove_file(layouts.join("post.html")).unwrap();
        let second = registry.render("post", doc("a"))?;
        assert_eq!("[a]", first);
        assert_eq!(first, second);
        assert_eq!(1, registry.len());
        Ok(())
    }

    #[test]
    fn test_layout_names() -> Result<()> {
        let dir = project();
        let layouts = dir.path().join(LAYOUTS_DIRECTORY);
        write(&layouts, "default.html", "default");
        let mut registry = LayoutRegistry::new(&layouts);
        assert_eq!("default", registry.render("default", doc(""))?);
        assert_eq!("default", registry.render("default.html", doc(""))?);
        Ok(())
    }

    #[test]
    fn test_missing_layout() {
        let dir = project();
        let mut registry =
            LayoutRegistry::new(&dir.path().join(LAYOUTS_DIRECTORY));
        assert!(matches!(
            registry.get_layout("nope"),
            Err(Error::ReadLayout { .. })
        ));
    }

    #[test]
    fn test_layout_name_cannot_escape() {
        let dir = project();
        write(dir.path(), "x.html", "outside");
        let mut registry =
            LayoutRegistry::new(&dir.path().join(LAYOUTS_DIRECTORY));
        for name in ["../x", "../../x", "/etc/passwd", ""] {
            assert!(
                matches!(
                    registry.get_layout(name),
                    Err(Error::InvalidLayoutName(_))
                ),
                "`{}` was accepted",
                name
            );
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_nested_layout_name() -> Result<()> {
        let dir = project();
        let layouts = dir.path().join(LAYOUTS_DIRECTORY);
        std::fs::create_dir(layouts.join("blog")).unwrap();
        write(&layouts, "blog/wide.html", "wide");
        let mut registry = LayoutRegistry::new(&layouts);
        assert_eq!("wide", registry.render("blog/wide", doc(""))?);
        Ok(())
    }

    #[test]
    fn test_site_attached_only_when_referenced() -> Result<()> {
        let dir = project();
        let layouts = dir.path().join(LAYOUTS_DIRECTORY);
        let includes = dir.path().join(INCLUDES_DIRECTORY);
        std::fs::create_dir(&includes).unwrap();
        write(&includes, "footer.html", "{{.site}}");
        write(&layouts, "plain.html", "{{.content}}");
        write(&layouts, "direct.html", "{{.content}}|{{.site}}");

        let site = Value::String("SITE".to_owned());
        let mut registry = LayoutRegistry::new(&layouts);
        assert!(!registry.references_site("plain")?);
        assert_eq!("a", registry.render_with_site("plain", doc("a"), &site)?);
        assert!(registry.references_site("direct")?);
        assert_eq!(
            "a|SITE",
            registry.render_with_site("direct", doc("a"), &site)?
        );

        // Includes are part of every layout compiled after they're prepared.
        registry.prepare_includes(&includes)?;
        write(&layouts, "footed.html", "{{template \"footer\" .}}");
        assert!(registry.references_site("footed")?);
        assert_eq!("SITE", registry.render_with_site("footed", doc(""), &site)?);
        Ok(())
    }

    #[test]
    fn test_includes() -> Result<()> {
        let dir = project();
        let layouts = dir.path().join(LAYOUTS_DIRECTORY);
        let includes = dir.path().join(INCLUDES_DIRECTORY);
        std::fs::create_dir(&includes).unwrap();
        write(&includes, "header.html", "<h1>Header</h1>");
        write(
            &layouts,
            "post.html",
            "{{template \"header\" .}}{{.content}}",
        );

        let mut registry = LayoutRegistry::new(&layouts);
        registry.prepare_includes(&includes)?;
        assert_eq!("<h1>Header</h1>body", registry.render("post", doc("body"))?);
        Ok(())
    }

    #[test]
    fn test_missing_includes_directory() -> Result<()> {
        let dir = project();
        let mut registry =
            LayoutRegistry::new(&dir.path().join(LAYOUTS_DIRECTORY));
        registry.prepare_includes(&dir.path().join(INCLUDES_DIRECTORY))
    }

    #[test]
    fn test_include_name() {
        assert_eq!("header", include_name(Path::new("_includes/header.html")));
        assert_eq!("nav.min", include_name(Path::new("nav.min.html")));
        assert_eq!("plain", include_name(Path::new("plain")));
        assert_eq!(".hidden", include_name(Path::new(".hidden")));
    }
}
