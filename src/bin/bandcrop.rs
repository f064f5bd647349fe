//! CLI binary for pdf-bandcrop.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `RasterizeConfig` / `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_bandcrop::logging::{init_logging, LoggingConfig};
use pdf_bandcrop::{
    extract, rasterize, ExtractionConfig, ExtractionSummary, OutputPolicy, ProgressCallback,
    ProgressListener, RasterizeConfig, RasterizeSummary, RegionRules, Stage,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress listener using indicatif ────────────────────────────────────

/// Terminal progress: one bar per stage plus a log line per item.
struct CliProgress {
    bar: ProgressBar,
    item_started: Mutex<Option<Instant>>,
    problems: AtomicUsize,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Listing inputs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            item_started: Mutex::new(None),
            problems: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.item_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Stop the bar after a fatal error, leaving it on screen.
    fn abandon(&self) {
        self.bar.abandon();
    }
}

impl ProgressListener for CliProgress {
    fn on_stage_start(&self, stage: Stage, total_items: usize) {
        let unit = match stage {
            Stage::Rasterize => "docs",
            Stage::Extract => "images",
        };
        let style = ProgressStyle::with_template(&format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {unit}  \
             ⏱ {{elapsed_precise}}  ETA {{eta_precise}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.problems.store(0, Ordering::SeqCst);
        self.bar.reset();
        self.bar.set_length(total_items as u64);
        self.bar.set_style(style);
        self.bar.set_prefix(stage.to_string());
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{stage} {total_items} {unit}…"))
        ));
    }

    fn on_item_start(&self, _index: usize, _total: usize, name: &str) {
        if let Ok(mut t) = self.item_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_item_complete(&self, index: usize, total: usize, name: &str, outputs: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            green("✓"),
            index,
            total,
            name,
            dim(&format!("{outputs} files")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_item_skipped(&self, index: usize, total: usize, name: &str, reason: &str) {
        self.problems.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            yellow("↷"),
            index,
            total,
            name,
            yellow(&truncate(reason)),
        ));
        let _ = self.elapsed_secs();
        self.bar.inc(1);
    }

    fn on_item_error(&self, index: usize, total: usize, name: &str, error: &str) {
        self.problems.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(&truncate(error)),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_stage_complete(&self, stage: Stage, total_items: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let problems = self.problems.load(Ordering::SeqCst);
        if problems == 0 {
            eprintln!(
                "{} {stage}: {} items done",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {stage}: {}/{} items done  ({} skipped or failed)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total_items,
                red(&problems.to_string()),
            );
        }
    }
}

/// Keep one line per item in the terminal.
fn truncate(msg: &str) -> String {
    let first = msg.lines().next().unwrap_or_default();
    if first.chars().count() > 80 {
        let cut: String = first.chars().take(79).collect();
        format!("{cut}\u{2026}")
    } else {
        first.to_string()
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render every data/*.pdf into output/{stem}_page_{n}.jpg
  bandcrop rasterize

  # Cut output/*.jpg into output_images/{page}_{i}.jpg
  bandcrop extract

  # Both stages in one go
  bandcrop run

  # Pages rendered at 1x need smaller minimums
  bandcrop run --zoom 1.0 --min-width 200 --min-height 25 --padding 25

  # Keep earlier crops, machine-readable summary
  bandcrop extract --output-policy append --json > crops.json

ENVIRONMENT VARIABLES:
  Every flag has a BANDCROP_* counterpart, e.g. BANDCROP_ZOOM=1.5.
  PDFIUM_LIB_PATH   Directory containing the pdfium shared library
  RUST_LOG          Overrides --verbose / --quiet (e.g. pdf_bandcrop=trace)
"#;

/// Rasterize PDFs into page images and crop those pages into content bands.
#[derive(Parser, Debug)]
#[command(
    name = "bandcrop",
    version,
    about = "Rasterize PDFs to JPEG pages and crop each page into its content bands",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every page of every matching PDF to a JPEG.
    Rasterize {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        pages: PagesArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Crop the content bands out of every matching page image.
    Extract {
        #[command(flatten)]
        pages: PagesArgs,
        #[command(flatten)]
        regions: RegionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Rasterize, then extract from the freshly written pages.
    Run {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        pages: PagesArgs,
        #[command(flatten)]
        regions: RegionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Print the run summary as JSON on stdout.
    #[arg(long, global = true, env = "BANDCROP_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "BANDCROP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "BANDCROP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "BANDCROP_QUIET")]
    quiet: bool,

    /// Log file receiving timestamped info/error lines.
    #[arg(long, global = true, env = "BANDCROP_LOG_FILE", default_value = "processing.log")]
    log_file: PathBuf,

    /// Do not write a log file.
    #[arg(long, global = true, env = "BANDCROP_NO_LOG_FILE")]
    no_log_file: bool,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Directory containing the source PDFs.
    #[arg(long, env = "BANDCROP_SOURCE_DIR", default_value = "data")]
    source_dir: PathBuf,

    /// Glob selecting PDFs inside the source directory.
    #[arg(long, env = "BANDCROP_PDF_PATTERN", default_value = "*.pdf")]
    pdf_pattern: String,

    /// Page scale factor (0.1–10.0).
    #[arg(long, env = "BANDCROP_ZOOM", default_value_t = 2.0)]
    zoom: f32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "BANDCROP_PASSWORD")]
    password: Option<String>,
}

#[derive(Args, Debug)]
struct PagesArgs {
    /// Directory holding page images (rasterize output, extract input).
    #[arg(long, env = "BANDCROP_PAGES_DIR", default_value = "output")]
    pages_dir: PathBuf,

    /// Glob selecting page images inside the pages directory.
    #[arg(long, env = "BANDCROP_IMAGE_PATTERN", default_value = "*.jpg")]
    image_pattern: String,
}

#[derive(Args, Debug)]
struct RegionArgs {
    /// Directory receiving the crops.
    #[arg(long, env = "BANDCROP_CROPS_DIR", default_value = "output_images")]
    crops_dir: PathBuf,

    /// Pixels darker than this (0–255) are content.
    #[arg(long, env = "BANDCROP_THRESHOLD", default_value_t = RegionRules::default().threshold)]
    threshold: u8,

    /// Minimum region width in pixels (inclusive).
    #[arg(long, env = "BANDCROP_MIN_WIDTH", default_value_t = RegionRules::default().min_width)]
    min_width: u32,

    /// Region height must exceed this many pixels.
    #[arg(long, env = "BANDCROP_MIN_HEIGHT", default_value_t = RegionRules::default().min_height)]
    min_height: u32,

    /// Pixels added above each region.
    #[arg(long, env = "BANDCROP_PADDING", default_value_t = RegionRules::default().padding)]
    padding: u32,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// JPEG quality for written images (1–100).
    #[arg(long, env = "BANDCROP_JPEG_QUALITY", default_value_t = pdf_bandcrop::config::DEFAULT_JPEG_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// What to do when an output directory already exists.
    #[arg(long, env = "BANDCROP_OUTPUT_POLICY", value_enum, default_value = "clean")]
    output_policy: PolicyArg,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Clean,
    Append,
    FailIfExists,
}

impl From<PolicyArg> for OutputPolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::Clean => OutputPolicy::Clean,
            PolicyArg::Append => OutputPolicy::Append,
            PolicyArg::FailIfExists => OutputPolicy::FailIfExists,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let g = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar owns stderr unless --verbose; the log file always
    // gets info lines.
    let show_progress = !g.quiet && !g.no_progress && !g.json;
    let level = if g.verbose { "debug" } else { "info" };
    let console_level = if g.verbose {
        "debug"
    } else if g.quiet || show_progress || g.json {
        "error"
    } else {
        "info"
    };
    let _guard = init_logging(&LoggingConfig {
        level: level.to_string(),
        console_level: console_level.to_string(),
        file: (!g.no_log_file).then(|| g.log_file.clone()),
    })
    .context("Failed to initialise logging")?;

    let progress = show_progress.then(CliProgress::new);
    let callback = progress.clone().map(|p| p as ProgressCallback);

    let result = run(&cli, callback);
    if result.is_err() {
        if let Some(p) = progress {
            p.abandon();
        }
    }
    result
}

fn run(cli: &Cli, progress: Option<ProgressCallback>) -> Result<()> {
    let g = &cli.global;
    match &cli.command {
        Command::Rasterize {
            source,
            pages,
            output,
        } => {
            let config = rasterize_config(source, pages, output, progress)?;
            let summary = rasterize(&config).context("Rasterization failed")?;
            if g.json {
                print_json(&summary)?;
            } else if !g.quiet {
                report_rasterize(&summary, &config);
            }
        }
        Command::Extract {
            pages,
            regions,
            output,
        } => {
            let config = extraction_config(pages, regions, output, progress)?;
            let summary = extract(&config).context("Extraction failed")?;
            if g.json {
                print_json(&summary)?;
            } else if !g.quiet {
                report_extract(&summary, &config);
            }
        }
        Command::Run {
            source,
            pages,
            regions,
            output,
        } => {
            let r_config = rasterize_config(source, pages, output, progress.clone())?;
            let e_config = extraction_config(pages, regions, output, progress)?;

            let rasterized = rasterize(&r_config).context("Rasterization failed")?;
            let extracted = extract(&e_config).context("Extraction failed")?;
            if g.json {
                print_json(&serde_json::json!({
                    "rasterize": rasterized,
                    "extract": extracted,
                }))?;
            } else if !g.quiet {
                report_rasterize(&rasterized, &r_config);
                report_extract(&extracted, &e_config);
            }
        }
    }
    Ok(())
}

fn rasterize_config(
    source: &SourceArgs,
    pages: &PagesArgs,
    output: &OutputArgs,
    progress: Option<ProgressCallback>,
) -> Result<RasterizeConfig> {
    let mut builder = RasterizeConfig::builder()
        .source_dir(&source.source_dir)
        .output_dir(&pages.pages_dir)
        .pattern(&source.pdf_pattern)
        .zoom(source.zoom)
        .jpeg_quality(output.jpeg_quality)
        .output_policy(output.output_policy.into());
    if let Some(ref pwd) = source.password {
        builder = builder.password(pwd);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid rasterize configuration")
}

fn extraction_config(
    pages: &PagesArgs,
    regions: &RegionArgs,
    output: &OutputArgs,
    progress: Option<ProgressCallback>,
) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .input_dir(&pages.pages_dir)
        .output_dir(&regions.crops_dir)
        .pattern(&pages.image_pattern)
        .threshold(regions.threshold)
        .min_width(regions.min_width)
        .min_height(regions.min_height)
        .padding(regions.padding)
        .jpeg_quality(output.jpeg_quality)
        .output_policy(output.output_policy.into());
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid extraction configuration")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise summary")?;
    println!("{json}");
    Ok(())
}

fn report_rasterize(summary: &RasterizeSummary, config: &RasterizeConfig) {
    eprintln!(
        "{}  {} documents  {} pages  {}ms  →  {}",
        green("✔"),
        summary.stats.documents,
        summary.stats.pages_written,
        summary.stats.total_duration_ms,
        bold(&config.output_dir.display().to_string()),
    );
}

fn report_extract(summary: &ExtractionSummary, config: &ExtractionConfig) {
    let s = &summary.stats;
    eprintln!(
        "{}  {}/{} images  {} crops  {}ms  →  {}",
        if s.skipped_images + s.failed_images == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        s.processed_images,
        s.total_images,
        s.crops_written,
        s.total_duration_ms,
        bold(&config.output_dir.display().to_string()),
    );
    if s.skipped_images + s.failed_images > 0 {
        eprintln!(
            "   {} skipped  /  {} failed",
            dim(&s.skipped_images.to_string()),
            dim(&s.failed_images.to_string()),
        );
    }
}
