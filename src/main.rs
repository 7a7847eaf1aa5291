use anyhow::{Context, Result};
use clap::{App, Arg};
use heckle::build::build_site;
use std::path::PathBuf;

fn main() -> Result<()> {
    let matches = App::new("heckle")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a static site from Markdown posts, pages, and layouts")
        .arg(
            Arg::with_name("project")
                .help("The project directory to build (default: `.`)")
                .index(1),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Logs every rendered and copied file"),
        )
        .get_matches();

    let level = match matches.is_present("verbose") {
        true => "debug",
        false => "info",
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level),
    )
    .init();

    let project = PathBuf::from(matches.value_of("project").unwrap_or("."));
    build_site(&project).with_context(|| {
        format!("Building site in '{}'", project.display())
    })
}
