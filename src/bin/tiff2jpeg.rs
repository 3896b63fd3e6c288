use std::{path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use serde_json::json;
use tiff2jpeg::{ConvertOptions, ProgressCallback, ProgressInfo, TiffContainer};

const CLI_AFTER_HELP: &str = "Examples:\n  tiff2jpeg convert scan.tif --out pages --progress\n  tiff2jpeg convert scan.tif --out pages --threads 4 --json\n  tiff2jpeg info scan.tif --json\n  tiff2jpeg completions zsh > _tiff2jpeg";

#[derive(Debug, Parser)]
#[command(
    name = "tiff2jpeg",
    version,
    about = "Split multi-page TIFF files into one JPEG per page",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Log level (off, error, warn, info, debug, trace). Overrides --verbose.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert every page to a JPEG file.
    #[command(
        about = "Convert TIFF pages to JPEG files",
        after_help = "Examples:\n  tiff2jpeg convert scan.tif --out pages\n  tiff2jpeg convert scan.tif --out pages --threads 2 --progress"
    )]
    Convert {
        /// Input multi-page TIFF path.
        input: PathBuf,
        /// Output directory (created if missing).
        #[arg(long)]
        out: PathBuf,
        /// Worker thread count. Defaults to the number of CPUs.
        #[arg(long)]
        threads: Option<usize>,
        /// Print the summary as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print page count and per-page metadata.
    #[command(about = "Print page metadata", visible_alias = "probe")]
    Info {
        /// Input multi-page TIFF path.
        input: PathBuf,
        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn parse_log_level(value: &str) -> Option<LevelFilter> {
    match value.to_ascii_lowercase().as_str() {
        "off" | "quiet" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warning" | "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" | "verbose" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

fn init_logging(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let level = match &global.log_level {
        Some(level) => {
            parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?
        }
        None if global.verbose => LevelFilter::Debug,
        None => LevelFilter::Warn,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    Ok(())
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{msg} {spinner:.green} {bar:40.cyan/blue} {pos}/{len} frame [{elapsed_precise}<{eta_precise}]",
        )?;
        bar.set_style(style.progress_chars("##-"));
        bar.set_message("Converting TIFF to JPEG");
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_start(&self, total: u64) {
        self.bar.set_length(total);
    }

    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        if info.current == info.total {
            self.bar.finish();
        }
    }
}

fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global)?;

    match cli.command {
        Commands::Convert {
            input,
            out,
            threads,
            json,
        } => {
            let mut options = ConvertOptions::new();
            if let Some(threads) = threads {
                options = options.with_threads(threads);
            }
            if cli.global.progress {
                options = options.with_progress(Arc::new(TerminalProgress::new()?));
            }

            let summary = tiff2jpeg::convert_with_options(&input, &out, &options)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary.to_json())?);
            } else {
                for failure in &summary.failed {
                    eprintln!(
                        "{} {}",
                        "error:".red().bold(),
                        format!("page {}: {}", failure.page, failure.error).red()
                    );
                }
                if summary.is_success() {
                    println!(
                        "{} {}",
                        "success:".green().bold(),
                        format!(
                            "Wrote {} page(s) to {}",
                            summary.succeeded_count(),
                            out.display()
                        )
                        .green()
                    );
                } else {
                    println!(
                        "{} {}",
                        "warning:".yellow().bold(),
                        format!(
                            "Wrote {} of {} page(s) to {} ({} failed)",
                            summary.succeeded_count(),
                            summary.page_count,
                            out.display(),
                            summary.failed_count()
                        )
                        .yellow()
                    );
                }
            }

            Ok(summary.is_success())
        }
        Commands::Info { input, json } => {
            let container = TiffContainer::open(&input)?;
            let pages = container.pages()?;

            if json {
                let payload = json!({
                    "path": input.display().to_string(),
                    "page_count": container.page_count(),
                    "pages": pages.iter().map(|page| page.to_json()).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{} {}", "file:".cyan().bold(), input.display());
                println!("{} {}", "pages:".cyan().bold(), container.page_count());
                for page in &pages {
                    println!(
                        "  {:05}  {}x{}  {}",
                        page.index, page.width, page.height, page.color_type
                    );
                }
            }

            Ok(true)
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "tiff2jpeg", &mut std::io::stdout());
            Ok(true)
        }
    }
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, parse_log_level};
    use clap::CommandFactory;
    use log::LevelFilter;

    #[test]
    fn parse_log_level_aliases() {
        assert_eq!(parse_log_level("warn"), Some(LevelFilter::Warn));
        assert_eq!(parse_log_level("WARNING"), Some(LevelFilter::Warn));
        assert_eq!(parse_log_level("verbose"), Some(LevelFilter::Debug));
        assert_eq!(parse_log_level("quiet"), Some(LevelFilter::Off));
        assert!(parse_log_level("loud").is_none());
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
