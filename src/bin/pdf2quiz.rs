//! CLI binary for pdf2quiz.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and writes the workbook.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2quiz::{
    extract_to_file, inspect, ExtractionConfig, ExtractionProgressCallback, PageSelection,
    ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-page log
/// lines. Pages are processed sequentially, so events always arrive in page
/// order.
struct CliProgressCallback {
    bar: ProgressBar,
    questions: AtomicUsize,
    empties: AtomicUsize,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Rendering pages…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            questions: AtomicUsize::new(0),
            empties: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting questions from {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_questions(&self, page_num: usize, total: usize, count: usize) {
        self.questions.fetch_add(count, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{count} questions")),
        ));
        self.bar.inc(1);
    }

    fn on_page_empty(&self, page_num: usize, total: usize) {
        self.empties.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            yellow("⚠"),
            page_num,
            total,
            yellow("no questions extracted — page may be blank"),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = truncate_for_display(error, 79);

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_pages: usize, total_questions: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        let empty = self.empties.load(Ordering::SeqCst);

        if failed == 0 && empty == 0 {
            eprintln!(
                "{} {} questions extracted from {} pages",
                green("✔"),
                bold(&total_questions.to_string()),
                total_pages,
            );
        } else {
            eprintln!(
                "{} {} questions from {} pages  ({} empty, {} failed)",
                if total_questions == 0 { red("✘") } else { cyan("⚠") },
                bold(&total_questions.to_string()),
                total_pages,
                empty,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # First 5 pages, 3 questions per page (defaults)
  pdf2quiz --pages 1-5 textbook.pdf -o questions.xlsx

  # Denser extraction from a single chapter
  pdf2quiz --pages 12-30 --questions-per-page 5 textbook.pdf -o ch2.xlsx

  # Use a specific model via OpenRouter
  pdf2quiz --provider openrouter --model google/gemini-flash-1.5 book.pdf

  # Keep the rendered page images for manual verification
  pdf2quiz --pages 1-3 --dump-pages ./pages book.pdf

  # Inspect PDF metadata (no API key needed)
  pdf2quiz --inspect-only book.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY       OpenAI API key
  OPENROUTER_API_KEY   OpenRouter API key
  ANTHROPIC_API_KEY    Anthropic API key
  GEMINI_API_KEY       Google Gemini API key
  PDF2QUIZ_PROVIDER    Override provider (openai, openrouter, anthropic, gemini, ollama)
  PDF2QUIZ_MODEL       Override model ID
  PDFIUM_LIB_PATH      Path to an existing libpdfium

SETUP:
  1. Set an API key:  export OPENAI_API_KEY=sk-...
  2. Extract:         pdf2quiz --pages 1-5 book.pdf -o questions.xlsx

The output workbook has one row per question; the correct option cell is
filled green. The third column is left blank for manual annotation.
"#;

/// Generate multiple-choice quiz spreadsheets from PDF pages using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2quiz",
    version,
    about = "Generate multiple-choice quiz spreadsheets from PDF pages using Vision LLMs",
    long_about = "Rasterise PDF pages, have a Vision Language Model extract multiple-choice \
questions from each page image, and compile them into a colour-coded .xlsx workbook where \
the correct option is highlighted. Supports OpenAI, OpenRouter, Anthropic, Google Gemini, \
and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the workbook to this file.
    #[arg(short, long, env = "PDF2QUIZ_OUTPUT", default_value = "questions.xlsx")]
    output: PathBuf,

    /// Page selection: all, 5, or 3-15 (1-indexed, inclusive).
    #[arg(long, env = "PDF2QUIZ_PAGES", default_value = "all")]
    pages: String,

    /// Questions to request per page (1-10).
    #[arg(short = 'n', long, env = "PDF2QUIZ_QUESTIONS", default_value_t = 3,
          value_parser = clap::value_parser!(u8).range(1..=10))]
    questions_per_page: u8,

    /// Rendering DPI (72–400). 300 keeps small print readable.
    #[arg(long, env = "PDF2QUIZ_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// JPEG quality for page images (1-100).
    #[arg(long, env = "PDF2QUIZ_JPEG_QUALITY", default_value_t = 85,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// LLM model ID (e.g. gpt-4.1-nano, google/gemini-flash-1.5).
    #[arg(long, env = "PDF2QUIZ_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, openrouter, anthropic, gemini, ollama.
    #[arg(long, env = "PDF2QUIZ_PROVIDER")]
    provider: Option<String>,

    /// Tag written into the unit column of every row.
    #[arg(long, env = "PDF2QUIZ_SOURCE_LABEL", default_value = "Vision AI")]
    source_label: String,

    /// Delay between VLM calls in milliseconds (rate-limit pacing).
    #[arg(long, env = "PDF2QUIZ_PACING_MS", default_value_t = 1000)]
    pacing_ms: u64,

    /// Retries per page on LLM failure.
    #[arg(long, env = "PDF2QUIZ_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Max LLM output tokens per page.
    #[arg(long, env = "PDF2QUIZ_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2QUIZ_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2QUIZ_PASSWORD")]
    password: Option<String>,

    /// Path to a text file with a custom extraction prompt ({n} = question count).
    #[arg(long, env = "PDF2QUIZ_PROMPT")]
    prompt: Option<PathBuf>,

    /// Write each rendered page JPEG to this directory for manual review.
    #[arg(long, env = "PDF2QUIZ_DUMP_PAGES")]
    dump_pages: Option<PathBuf>,

    /// Print PDF metadata only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2QUIZ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2QUIZ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2QUIZ_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2QUIZ_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-page LLM call timeout in seconds.
    #[arg(long, env = "PDF2QUIZ_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect PDF")?;

        println!("File:         {}", cli.input);
        if let Some(ref t) = meta.title {
            println!("Title:        {}", t);
        }
        if let Some(ref a) = meta.author {
            println!("Author:       {}", a);
        }
        if let Some(ref s) = meta.subject {
            println!("Subject:      {}", s);
        }
        println!("Pages:        {}", meta.page_count);
        println!("PDF Version:  {}", meta.pdf_version);
        if let Some(ref p) = meta.producer {
            println!("Producer:     {}", p);
        }
        if let Some(ref c) = meta.creator {
            println!("Creator:      {}", c);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    // ── Run extraction ───────────────────────────────────────────────────
    let stats = extract_to_file(&cli.input, &cli.output, &config)
        .await
        .context("Extraction failed")?;

    if !cli.quiet {
        eprintln!(
            "{}  {} questions  {} pages with content  →  {}",
            if stats.failed_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            bold(&stats.total_questions.to_string()),
            stats.processed_pages,
            bold(&cli.output.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&stats.total_input_tokens.to_string()),
            dim(&stats.total_output_tokens.to_string()),
            stats.total_duration_ms,
        );
        if stats.empty_pages > 0 {
            eprintln!(
                "   {} pages produced no questions (blank or unreadable)",
                yellow(&stats.empty_pages.to_string())
            );
        }
        if stats.failed_pages > 0 {
            eprintln!(
                "   {} pages failed after retries; the workbook covers the rest",
                red(&stats.failed_pages.to_string())
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let prompt = if let Some(ref path) = cli.prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let pages = parse_pages(&cli.pages)?;

    let mut builder = ExtractionConfig::builder()
        .dpi(cli.dpi)
        .jpeg_quality(cli.jpeg_quality)
        .questions_per_page(cli.questions_per_page)
        .pages(pages)
        .source_label(cli.source_label.clone())
        .pacing_ms(cli.pacing_ms)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    if let Some(ref dir) = cli.dump_pages {
        builder = builder.dump_pages_dir(dir.clone());
    }

    let mut config = builder.build().context("Invalid configuration")?;

    // Apply fields the builder wraps in Option (None must stay None)
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.password = cli.password.clone();
    config.prompt = prompt;

    Ok(config)
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start.trim().parse().context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

/// Truncate a long error message to keep output tidy.
///
/// Cuts on a character boundary: provider errors often echo Arabic page
/// content, and a byte-offset slice would panic mid-character.
fn truncate_for_display(error: &str, max_chars: usize) -> String {
    match error.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_messages_pass_through_untruncated() {
        assert_eq!(truncate_for_display("HTTP 429", 79), "HTTP 429");
    }

    #[test]
    fn long_ascii_messages_are_truncated_with_ellipsis() {
        let long = "x".repeat(200);
        let msg = truncate_for_display(&long, 79);
        assert_eq!(msg.chars().count(), 80);
        assert!(msg.ends_with('\u{2026}'));
    }

    #[test]
    fn multibyte_messages_truncate_on_char_boundaries() {
        // Provider errors echoing Arabic page text are two bytes per char,
        // so a byte-offset cut would land inside a character.
        let arabic = "خطأ في الخادم: تعذر قراءة الصفحة المطلوبة بسبب انتهاء مهلة الاتصال بالخدمة".repeat(3);
        let msg = truncate_for_display(&arabic, 79);
        assert_eq!(msg.chars().count(), 80);
        assert!(msg.ends_with('\u{2026}'));
    }

    #[test]
    fn parse_pages_forms() {
        assert!(matches!(parse_pages("all").unwrap(), PageSelection::All));
        assert!(matches!(
            parse_pages("7").unwrap(),
            PageSelection::Single(7)
        ));
        assert!(matches!(
            parse_pages("3-15").unwrap(),
            PageSelection::Range(3, 15)
        ));
        assert!(parse_pages("15-3").is_err());
        assert!(parse_pages("0").is_err());
    }
}
