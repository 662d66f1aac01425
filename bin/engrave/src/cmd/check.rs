//! Check command - load every record and report problems without writing

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, bail};
use engrave_core::Config;
use engrave_generator::{BuildContext, Builder};

use super::build::load_config;

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

/// Run the check command.
///
/// With `strict`, any warning fails the check.
pub fn run(config_path: &Path, root: Option<&Path>, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and records");

    println!("Checking configuration...");
    let config = load_config(config_path, root)?;
    println!("  ✓ Configuration valid");

    let mut result = ValidationResult::default();
    check_directories(&config, &mut result);

    println!("\nChecking people...");
    let ctx = Builder::new(config)
        .load()
        .wrap_err("Failed to load people")?;
    check_records(&ctx, &mut result);

    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if !result.errors.is_empty() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if !result.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if !result.errors.is_empty() {
        bail!("Check failed with {} error(s)", result.errors.len());
    }
    if strict && !result.warnings.is_empty() {
        bail!(
            "Check failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");
    Ok(())
}

fn check_directories(config: &Config, result: &mut ValidationResult) {
    let static_dir = config.static_dir();
    if !static_dir.is_dir() {
        result.add_warning(format!(
            "Static directory missing: {}",
            static_dir.display()
        ));
    }

    let output = config.output_dir();
    if output.exists() && !output.is_dir() {
        result.add_error(format!(
            "Output path exists but is not a directory: {}",
            output.display()
        ));
    }

    if config.site.comment_repo.is_none() {
        result.add_warning("site.comment_repo is not set; pages will have no comments");
    }
}

fn check_records(ctx: &BuildContext, result: &mut ValidationResult) {
    for skipped in &ctx.skipped {
        result.add_warning(format!("{}: skipped, {}", skipped.dir_name, skipped.reason));
    }

    for record in &ctx.records {
        if !record.is_publishable() {
            result.add_warning(format!(
                "{}: no default-locale page, will not be published",
                record.id
            ));
        }
        for issue in &record.issues {
            result.add_warning(format!("{}: {issue}", record.id));
        }
    }

    let published = ctx.publishable().count();
    println!(
        "  ℹ {} records loaded, {published} publishable, {} skipped",
        ctx.records.len(),
        ctx.skipped.len()
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("people")).unwrap();
        fs::create_dir_all(dir.path().join("public")).unwrap();
        fs::write(
            dir.path().join("engrave.toml"),
            "[site]\ncomment_repo = \"owner/repo\"\n",
        )
        .unwrap();
        for (path, contents) in files {
            let path = dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        dir
    }

    #[test]
    fn test_clean_project_passes_strict() {
        let dir = project(&[
            ("people/a/info.yml", "info:\n  died: 2020-01-01\n"),
            ("people/a/page.md", "bio"),
        ]);

        run(&dir.path().join("engrave.toml"), Some(dir.path()), true).unwrap();
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn test_warnings_fail_only_in_strict_mode() {
        let dir = project(&[
            ("people/a/info.yml", "info:\n  died: last spring\n"),
            ("people/a/page.md", "bio"),
            ("people/b/page.md", "no info"),
        ]);
        let config = dir.path().join("engrave.toml");

        run(&config, Some(dir.path()), false).unwrap();
        assert!(run(&config, Some(dir.path()), true).is_err());
    }

    #[test]
    fn test_missing_people_dir_fails() {
        let dir = project(&[]);
        fs::remove_dir(dir.path().join("people")).unwrap();

        assert!(run(&dir.path().join("engrave.toml"), Some(dir.path()), false).is_err());
    }
}
