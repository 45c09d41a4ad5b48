use anyhow::Result;
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Build settings merged from defaults, a config file, the environment and the
/// command line.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StencilConfig {
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Source directory
    pub source: String,
    /// Destination directory
    pub destination: String,
    /// Apply production overrides from globals.spec
    pub prod: bool,
    /// Debug logging
    pub debug: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: "./site".to_string(),
            destination: "./out".to_string(),
            prod: false,
            debug: false,
        }
    }
}

impl StencilConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (STENCIL_BUILD__*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        // 1. Start with defaults
        builder = builder.add_source(ConfigBuilder::try_from(&Self::default())?);

        // 2. Add configuration file if it exists
        if let Some(config_file) = args.get_one::<String>("config") {
            let path = Path::new(config_file);
            if path.exists() {
                builder = builder.add_source(File::from(path));
            }
        }

        // 3. Add environment variables with STENCIL_ prefix
        builder = builder.add_source(
            Environment::with_prefix("STENCIL")
                .prefix_separator("_")
                .separator("__") // Use double underscore for nested keys
                .try_parsing(true),
        );

        // 4. Override with CLI arguments (highest priority)
        if let Some(source) = args.get_one::<String>("source") {
            builder = builder.set_override("build.source", source.as_str())?;
        }
        if let Some(destination) = args.get_one::<String>("destination") {
            builder = builder.set_override("build.destination", destination.as_str())?;
        }
        // Flags only switch things on, so a config file can still enable them.
        if args.get_flag("prod") {
            builder = builder.set_override("build.prod", true)?;
        }
        if args.get_flag("debug") {
            builder = builder.set_override("build.debug", true)?;
        }

        let config = builder.build()?;
        let stencil_config: StencilConfig = config.try_deserialize()?;

        Ok(stencil_config)
    }

    pub fn build_config(&self) -> &BuildConfig {
        &self.build
    }
}

/// Load configuration for a build run
pub fn load_build_config(args: &ArgMatches) -> Result<StencilConfig> {
    StencilConfig::load(args)
}
