//! Build command - regenerates the whole site

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use engrave_core::Config;
use engrave_generator::{BuildStats, Builder};

/// Load the configuration and apply a `--root` override.
pub(crate) fn load_config(config_path: &Path, root: Option<&Path>) -> Result<Config> {
    let mut config = Config::load_or_default(config_path).wrap_err_with(|| {
        format!("Failed to load configuration from {}", config_path.display())
    })?;

    if let Some(root) = root {
        tracing::info!(root = %root.display(), "Overriding project root from CLI");
        config.build.root = root.to_path_buf();
    }

    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Run the build command.
///
/// Fails only when the configuration is invalid or the people directory is
/// missing; per-person problems are logged and counted.
pub fn run(config_path: &Path, output: Option<&Path>, root: Option<&Path>) -> Result<BuildStats> {
    let start = Instant::now();
    tracing::info!(?config_path, ?output, ?root, "Starting build");

    let config = load_config(config_path, root)?;

    let mut builder = Builder::new(config);
    if let Some(output) = output {
        builder = builder.with_output_dir(output);
    }

    let stats = builder.build().wrap_err("Build failed")?;
    let duration = start.elapsed();

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Published:   {}", stats.published);
    println!("  Unpublished: {}", stats.unpublished);
    println!("  Skipped:     {}", stats.skipped);
    if stats.failed > 0 {
        println!("  Failed:      {}", stats.failed);
    }
    println!("  Page files:  {}", stats.pages);
    println!("  Assets:      {}", stats.assets);
    println!();
    println!("  Duration:    {:.2}s", duration.as_secs_f64());
    println!("  Output:      {}", builder.output_dir().display());
    println!();

    tracing::info!(%stats, "Build completed successfully");
    Ok(stats)
}
