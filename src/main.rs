use clap::{Parser, Subcommand};
use responsive_variants::config::{self, Settings};
use responsive_variants::imaging::RustBackend;
use responsive_variants::logging;
use responsive_variants::output::{self, SourceReport};
use responsive_variants::service::{ImageManipulation, ResponsiveImageService};
use responsive_variants::source::{SourceImage, upload_hash};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "responsive-variants")]
#[command(about = "Generate responsive image variants from uploaded originals")]
#[command(long_about = "\
Generate responsive image variants from uploaded originals

Every source image is rendered once per configured breakpoint (plus a
double-resolution _x2 variant where enabled), optionally converted to
another format and stamped with a text watermark. Variants are written to
the work directory as {key}_{hash}, where hash is {stem}_{sha256 prefix}.

Breakpoints, quality, watermark and worker limits come from
responsive.toml (current directory, or --config).

Run 'responsive-variants gen-config' to generate a documented config.")]
#[command(version)]
struct Cli {
    /// Settings file (default: ./responsive.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render variants for image files or directories of images
    Generate {
        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Where variant files are written
        #[arg(long, default_value = "variants")]
        work_dir: PathBuf,

        /// Print the result collection as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Validate the settings and show the resolved breakpoints
    Check,
    /// Print a stock responsive.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json_logs);

    match cli.command {
        Command::Generate {
            inputs,
            work_dir,
            json,
        } => {
            let settings = load_settings(cli.config.as_deref())?;
            let backend = RustBackend::with_font(settings.watermark_font());
            let service = ResponsiveImageService::new(backend, settings.to_generation_config())?;
            std::fs::create_dir_all(&work_dir)?;

            let sources = collect_sources(&service, &inputs);
            if sources.is_empty() {
                return Err("no supported images found".into());
            }

            let mut reports = Vec::with_capacity(sources.len());
            for (index, path) in sources.iter().enumerate() {
                let hash = upload_hash(path)?;
                let source = SourceImage::from_path(path, hash)
                    .with_storage_path(path.display().to_string());
                let variants = service.generate_responsive_formats(&source, &work_dir)?;
                let report = SourceReport {
                    source: source.name.clone(),
                    hash: source.hash.clone(),
                    variants,
                };
                if !json {
                    output::print_source_report(index + 1, path, &report);
                }
                reports.push(report);
            }
            if json {
                println!("{}", output::format_json(&reports)?);
            }
        }
        Command::Check => {
            let settings = load_settings(cli.config.as_deref())?;
            let path = config_path(cli.config.as_deref());
            output::print_config_summary(path.as_deref(), &settings.to_generation_config());
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Explicit `--config` must exist; otherwise `./responsive.toml` is optional.
fn load_settings(explicit: Option<&Path>) -> Result<Settings, config::ConfigError> {
    match explicit {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(config::CONFIG_FILE_NAME);
            default.exists().then_some(default)
        }
    }
}

/// Expand inputs into supported image files. Directories are walked in
/// sorted order; unsupported files are skipped.
fn collect_sources(service: &impl ImageManipulation, inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let files = WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping unreadable entry");
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path());
            for path in files {
                if is_supported(service, &path) {
                    sources.push(path);
                } else {
                    tracing::debug!(path = %path.display(), "not a supported image, skipped");
                }
            }
        } else if is_supported(service, input) {
            sources.push(input.clone());
        } else {
            tracing::warn!(path = %input.display(), "not a supported image, skipped");
        }
    }
    sources
}

fn is_supported(service: &impl ImageManipulation, path: &Path) -> bool {
    service.is_supported_image(&SourceImage::from_path(path, ""))
}
