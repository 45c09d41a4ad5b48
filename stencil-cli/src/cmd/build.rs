use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use stencil_core::compile_source;

use crate::config::StencilConfig;

pub fn add_build_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("source")
                .value_name("SOURCE")
                .help("Source directory with pages.spec, globals.spec, templates and content")
                .required(true),
        )
        .arg(
            Arg::new("destination")
                .value_name("DESTINATION")
                .help("Output directory, emptied before every build")
                .required(true),
        )
        .arg(
            Arg::new("prod")
                .short('p')
                .long("prod")
                .help("Production build: apply `prod:` overrides from globals.spec")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Show debug logs")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Build configuration file")
                .default_value("./stencil.toml"),
        )
}

pub fn make_command() -> Command {
    add_build_args(Command::new("stencil"))
        .about("Compile page specs, templates and markdown into a static site")
        .version(env!("CARGO_PKG_VERSION"))
}

pub fn execute(config: &StencilConfig) -> Result<()> {
    let build = config.build_config();

    log::info!("Source directory set to {}", build.source);
    log::info!("Destination directory set to {}", build.destination);
    if build.prod {
        log::info!("Production flag is set");
    }

    let summary = compile_source(&build.source, &build.destination, build.prod)
        .with_context(|| format!("failed to compile {}", build.source))?;

    log::info!(
        "Wrote {} pages and {} static files to {}",
        summary.pages,
        summary.static_files,
        build.destination
    );

    Ok(())
}
