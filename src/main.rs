//! Dossier: security-testing report renderer CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dossier::check::{CheckReport, Checker};
use dossier::config::{default_config_json, load_config, Config, CONFIG_FILENAME};
use dossier::export::{ExportOutcome, PdfExporter};
use dossier::logging;
use dossier::reporter::{ConsoleReporter, JsonReporter};
use dossier::source::{source_for, FsSource};
use dossier::watcher::{ContentWatcher, InputFingerprint};
use dossier::{RenderedReport, ReportDocument, ReportRenderer};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Dossier: render security-testing reports from JSON content
#[derive(Parser, Debug)]
#[command(name = "dossier")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: search .dossierrc.json in current dir and parents)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the content document to an HTML page
    Render {
        /// Content document (default: content.json, or "content" from config)
        content: Option<PathBuf>,

        /// Output HTML file (default: report.html)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Watch the content directory and re-render on changes
        #[arg(long)]
        watch: bool,

        /// Render sections one at a time
        #[arg(long)]
        sequential: bool,

        /// Number of parallel threads (default: number of CPU cores)
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Report content the renderer would degrade or guess at
    Check {
        /// Content document (default: content.json, or "content" from config)
        content: Option<PathBuf>,

        /// Output format as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Export the rendered report as a paginated A4 PDF
    Pdf {
        /// Content document (default: content.json, or "content" from config)
        content: Option<PathBuf>,

        /// Output PDF file
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Capture this already rendered HTML page instead of rendering the content
        #[arg(long, conflicts_with = "image")]
        page: Option<PathBuf>,

        /// Paginate an existing full-page capture (PNG or JPEG) instead of running a browser
        #[arg(long)]
        image: Option<PathBuf>,

        /// Headless browser to capture with (path or name on PATH)
        #[arg(long)]
        browser: Option<PathBuf>,
    },

    /// Create .dossierrc.json with sensible defaults
    Init {
        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();
    logging::init(logging::level_for(args.quiet, args.verbose));

    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    match args.command {
        Commands::Init { dir } => run_init(dir.as_deref().unwrap_or(&cwd)),
        Commands::Render {
            content,
            output,
            watch,
            sequential,
            jobs,
        } => {
            let config = load_config(&cwd, args.config.as_deref())?.merge_with_cli(
                content.as_deref(),
                output.as_deref(),
                None,
            );
            if let Some(jobs) = jobs {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(jobs)
                    .build_global()
                    .ok();
            }
            if watch {
                run_watch(&config, sequential)
            } else {
                run_render(&config, sequential)
            }
        }
        Commands::Check { content, json } => {
            let config =
                load_config(&cwd, args.config.as_deref())?.merge_with_cli(content.as_deref(), None, None);
            run_check(&config, json, args.verbose)
        }
        Commands::Pdf {
            content,
            output,
            page,
            image,
            browser,
        } => {
            let mut config = load_config(&cwd, args.config.as_deref())?.merge_with_cli(
                content.as_deref(),
                None,
                browser.as_deref(),
            );
            if output.is_some() {
                config.pdf_output = output;
            }
            run_pdf(&config, page.as_deref(), image.as_deref())
        }
    }
}

fn render_report(config: &Config, sequential: bool) -> RenderedReport {
    let mut options = config.render_options();
    if sequential {
        options = options.sequential();
    }
    let (source, name) = source_for(&config.content_path());
    ReportRenderer::new(options).render_from(&*source, &name)
}

/// Render once and write the page. Returns whether the content loaded.
fn render_to_file(config: &Config, sequential: bool) -> Result<bool> {
    let report = render_report(config, sequential);
    let output = config.output_path();
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&output, report.to_page(config.chart_js_url()))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if !report.is_error() {
        log::info!(
            "Rendered {} to {} ({} chart(s))",
            config.content_path().display(),
            output.display(),
            report.charts.len()
        );
    }
    Ok(!report.is_error())
}

fn run_render(config: &Config, sequential: bool) -> Result<ExitCode> {
    if render_to_file(config, sequential)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}

fn run_watch(config: &Config, sequential: bool) -> Result<ExitCode> {
    let root = FsSource::for_content_file(&config.content_path())
        .root()
        .to_path_buf();
    let mut fingerprint = InputFingerprint::new();
    fingerprint.changed(InputFingerprint::compute(&root));
    render_to_file(config, sequential)?;

    let watcher = ContentWatcher::watch(&config.content_path())
        .context("Failed to create file watcher")?;
    log::info!("Watching {} for changes... (Ctrl+C to stop)", root.display());

    loop {
        let paths = watcher.next_changes();
        if paths.is_empty() {
            continue;
        }
        if !fingerprint.changed(InputFingerprint::compute(&root)) {
            log::debug!("Inputs unchanged; skipping render");
            continue;
        }
        let stamp = chrono::Local::now().format("%H:%M:%S");
        for path in &paths {
            log::debug!("Changed: {}", path.display());
        }
        log::info!("[{}] {} file(s) changed, re-rendering", stamp, paths.len());
        if let Err(e) = render_to_file(config, sequential) {
            log::error!("{:#}", e);
        }
    }
}

fn run_check(config: &Config, json: bool, verbose: bool) -> Result<ExitCode> {
    let (source, name) = source_for(&config.content_path());
    let doc = ReportDocument::load(&*source, &name).with_context(|| {
        format!(
            "Error loading report content. Please ensure {} exists.",
            config.content_path().display()
        )
    })?;

    let heatmap = config.heatmap_config();
    let report = CheckReport {
        content: config.content_path().display().to_string(),
        diagnostics: Checker::new(&*source, &heatmap).check(&doc),
    };

    if json {
        println!("{}", JsonReporter::new().pretty().report(&report));
    } else if verbose {
        ConsoleReporter::new().verbose().report(&report);
    } else {
        ConsoleReporter::new().report(&report);
    }

    if report.has_errors() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn run_pdf(config: &Config, page: Option<&Path>, image: Option<&Path>) -> Result<ExitCode> {
    let output = config.pdf_output_path();
    let mut exporter = PdfExporter::new();
    if let Some(browser) = &config.browser {
        exporter = exporter.browser(browser);
    }

    let outcome = if let Some(image) = image {
        exporter.export_image(image, &output)?
    } else if let Some(page) = page {
        let html = fs::read_to_string(page)
            .with_context(|| format!("Failed to read {}", page.display()))?;
        exporter.export_page(&html, &output)?
    } else {
        let report = render_report(config, false);
        if report.is_error() {
            return Ok(ExitCode::from(2));
        }
        exporter
            .title(report.title.clone())
            .export_page(&report.to_page(config.chart_js_url()), &output)?
    };

    match outcome {
        ExportOutcome::Written { path, pages } => {
            log::info!("Wrote {} page(s) to {}", pages, path.display());
            Ok(ExitCode::SUCCESS)
        }
        ExportOutcome::Aborted(_) => Ok(ExitCode::from(1)),
    }
}

fn run_init(dir: &Path) -> Result<ExitCode> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() {
        log::warn!(
            "{} already exists; use --dir to write elsewhere or remove it first",
            config_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    fs::write(&config_path, default_config_json() + "\n")
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    log::info!("Created {}", config_path.display());
    Ok(ExitCode::SUCCESS)
}
