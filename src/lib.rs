//! The library code for the `heckle` static site generator. A build is a
//! single pass over a project directory:
//!
//! 1. Loading `_config.yml` ([`crate::config`]) and collecting the dated
//!    posts in `_posts/` ([`crate::post`]), each split into front matter
//!    ([`crate::frontmatter`]) and a Markdown body ([`crate::markdown`]), with
//!    its URL expanded from the `postLink` pattern ([`crate::url`])
//! 2. Indexing posts by tag ([`crate::tag`]) and assembling the site context
//!    every template sees as `site` ([`crate::site`])
//! 3. Rendering each post through its layout ([`crate::layout`]) into
//!    `_site/`, then walking the rest of the project: Markdown files with
//!    front matter are rendered as pages and everything else is copied
//!    ([`crate::build`])
//!
//! Names beginning with `_` are reserved for the build and never treated as
//! content.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod document;
pub mod frontmatter;
pub mod layout;
pub mod markdown;
pub mod post;
pub mod site;
pub mod tag;
pub mod url;
pub mod value;
