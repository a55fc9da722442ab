//! CLI binary for edgequake-docedit.
//!
//! A thin shim over the library crate that maps CLI flags to `EditConfig`,
//! drives a `Session` and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use edgequake_docedit::edit::write_text;
use edgequake_docedit::{
    inspect, DocEditError, DocumentSummary, EditConfig, EditOutput, EditProgressCallback,
    HttpCompletionClient, PdfiumBackend, ProgressCallback, Session,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar per run, one log line per segment.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the segment in flight. Segments never overlap.
    segment_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_run_start` reports the segment count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            segment_started: Mutex::new(None),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} segments  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.reset();
        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Editing");
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    /// Clear a bar left behind by a run that ended in an error.
    fn abandon(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    fn segment_elapsed(&self) -> f64 {
        self.segment_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl EditProgressCallback for CliProgressCallback {
    fn on_enhance_start(&self) {
        self.bar.set_prefix("Preparing");
        self.bar.set_message("Sharpening instruction…");
    }

    fn on_run_start(&self, total_segments: usize, input_words: usize) {
        self.activate_bar(total_segments);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Editing {input_words} words in {total_segments} segment(s)…"
            ))
        ));
    }

    fn on_segment_start(&self, ordinal: usize, _total: usize) {
        if let Ok(mut started) = self.segment_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("segment {ordinal}"));
    }

    fn on_segment_complete(&self, ordinal: usize, total: usize, output_words: usize) {
        let elapsed = self.segment_elapsed();
        self.bar.println(format!(
            "  {} Segment {:>2}/{:<2}  {:<12}  {}",
            green("✓"),
            ordinal,
            total,
            dim(&format!("{output_words:>5} words")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_segment_error(&self, ordinal: usize, total: usize, error: &str) {
        let elapsed = self.segment_elapsed();
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Segment {:>2}/{:<2}  {}  {}",
            red("✗"),
            ordinal,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
    }

    fn on_gating(&self, _input_words: usize, _output_words: usize) {
        self.bar.set_message("checking length…");
    }

    fn on_run_complete(&self, accepted: bool, output_words: usize) {
        self.bar.finish_and_clear();
        if accepted {
            eprintln!("{} {} words accepted", green("✔"), bold(&output_words.to_string()));
        } else {
            eprintln!("{} result rejected ({} words)", red("✘"), output_words);
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Fix grammar, print to stdout
  docedit essay.pdf --prompt "Fix spelling and grammar"

  # Pasted text from stdin, result to a file
  pbpaste | docedit - --prompt "Use British spelling" -o edited.txt

  # Write <name>_edited.txt into a directory
  docedit report.txt --prompt-file style.txt --output-dir out/

  # Edit, then refine the accepted result twice
  docedit draft.txt --prompt "Fix typos" \
      --revise "Make the tone more formal" --revise "Use active voice"

  # Allow the model to shorten or restructure freely
  docedit notes.txt --prompt "Turn into a concise summary" --allow-major-rewrite

  # Page, word and segment counts (no API key needed)
  docedit --inspect-only thesis.pdf

LIMITS:
  PDFs longer than 15 pages are refused before any text is extracted.
  Pasted text is estimated at 2000 characters per page.
  Documents are edited in segments of at most 3500 words.
  A result with fewer than 90% of the input words is rejected unless
  --allow-major-rewrite is given.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          API key for the completion endpoint
  DOCEDIT_ENDPOINT        Chat-completions URL (any OpenAI-compatible server)
  DOCEDIT_MODEL           Model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
"#;

/// Edit documents with a chat-completion LLM while preserving length.
#[derive(Parser, Debug)]
#[command(
    name = "docedit",
    version,
    about = "Edit PDF and text documents with an LLM while preserving voice and length",
    long_about = "Apply a natural-language editing instruction to a PDF or text document \
using any OpenAI-compatible chat-completions endpoint. Long documents are edited segment by \
segment, and results that lose more than 10% of the words are rejected.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF or text file path, or "-" to read text from stdin.
    input: String,

    /// Editing instruction.
    #[arg(short, long, conflicts_with = "prompt_file")]
    prompt: Option<String>,

    /// Read the editing instruction from a file.
    #[arg(long, env = "DOCEDIT_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// API key for the completion endpoint (held in memory only).
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat-completions endpoint URL.
    #[arg(long, env = "DOCEDIT_ENDPOINT")]
    endpoint: Option<String>,

    /// Model ID.
    #[arg(long, env = "DOCEDIT_MODEL")]
    model: Option<String>,

    /// Max output tokens per segment.
    #[arg(long, env = "DOCEDIT_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "DOCEDIT_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Words per segment.
    #[arg(long, env = "DOCEDIT_MAX_WORDS", default_value_t = 3500)]
    max_words: usize,

    /// Page limit for PDFs and estimated pages for text.
    #[arg(long, env = "DOCEDIT_MAX_PAGES", default_value_t = 15)]
    max_pages: usize,

    /// Let the model shorten or restructure; skips the length check.
    #[arg(long)]
    allow_major_rewrite: bool,

    /// Sharpen the instruction with one extra model call first.
    #[arg(long)]
    enhance_prompt: bool,

    /// Further instruction applied to the previous accepted result.
    #[arg(long, value_name = "PROMPT")]
    revise: Vec<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "DOCEDIT_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Write the edited text to this file instead of stdout.
    #[arg(short, long, conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Write <source>_edited.txt into this directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output structured JSON (EditOutput) instead of plain text.
    #[arg(long, env = "DOCEDIT_JSON")]
    json: bool,

    /// Report page, word and segment counts only; no editing.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCEDIT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCEDIT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCEDIT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
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

    let cli_progress = show_progress.then(CliProgressCallback::new_dynamic);
    let progress_cb: Option<ProgressCallback> = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn EditProgressCallback>);

    let result = execute(&cli, progress_cb, show_progress).await;
    if result.is_err() {
        if let Some(ref cb) = cli_progress {
            cb.abandon();
        }
    }
    result
}

/// Everything after logging setup: inspect, or ingest, edit, revise and write.
async fn execute(cli: &Cli, progress: Option<ProgressCallback>, show_progress: bool) -> Result<()> {
    let config = build_config(cli, progress).await?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let summary = if cli.input == "-" {
            let text = read_stdin()?;
            let document = edgequake_docedit::pipeline::ingest::ingest_text(text, &config)
                .context("Failed to read input")?;
            DocumentSummary::of(&document, &config)
        } else {
            inspect(&cli.input, &config)
                .await
                .context("Failed to inspect document")?
        };
        print_summary(cli, &summary)?;
        return Ok(());
    }

    // ── Edit ─────────────────────────────────────────────────────────────
    let instruction = read_instruction(cli).await?;
    let client = HttpCompletionClient::new(&config).context("Cannot reach the model")?;

    let mut session = Session::new(config);
    session.set_allow_major_rewrite(cli.allow_major_rewrite);
    session.set_enhance_instruction(cli.enhance_prompt);

    if cli.input == "-" {
        session
            .load_text(read_stdin()?)
            .context("Failed to read input")?;
    } else {
        let backend = PdfiumBackend::from_env();
        session
            .load_file(Path::new(&cli.input), &backend)
            .await
            .with_context(|| format!("Failed to read {}", cli.input))?;
    }

    session.set_instruction(instruction);
    run_once(&mut session, &client).await?;

    for (i, prompt) in cli.revise.iter().enumerate() {
        if !cli.quiet {
            eprintln!("{} {}", cyan("↻"), bold(&format!("Revision {}: {prompt}", i + 1)));
        }
        session.revise().context("Failed to revise")?;
        session.set_instruction(prompt.clone());
        run_once(&mut session, &client).await?;
    }

    // ── Output ───────────────────────────────────────────────────────────
    let output = session
        .result()
        .context("No accepted result to write")?
        .clone();

    if let Some(ref dir) = cli.output_dir {
        let path = session
            .save_result(dir)
            .await
            .context("Failed to save result")?;
        report_written(cli, &output, &path);
    } else if let Some(ref path) = cli.output {
        write_text(path, &output.text)
            .await
            .context("Failed to write output")?;
        report_written(cli, &output, path);
    } else if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.text.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        if !cli.quiet && !show_progress {
            eprintln!(
                "Edited {} → {} words ({}%) in {}ms",
                output.stats.input_words,
                output.stats.output_words,
                output.stats.retained_percent,
                output.stats.total_duration_ms
            );
        }
    }

    Ok(())
}

/// Run the session once, turning a rejection into a readable error.
async fn run_once(session: &mut Session, client: &HttpCompletionClient) -> Result<()> {
    match session.run(client).await {
        Ok(_) => Ok(()),
        Err(e @ DocEditError::ExcessiveShortening { .. }) => Err(anyhow::Error::new(e)
            .context("Result rejected; pass --allow-major-rewrite to accept large cuts")),
        Err(e) => Err(anyhow::Error::new(e).context("Edit failed")),
    }
}

fn report_written(cli: &Cli, output: &EditOutput, path: &Path) {
    if cli.quiet {
        return;
    }
    eprintln!(
        "{}  {} → {} words ({}%)  {} segment(s)  {}ms  →  {}",
        green("✔"),
        output.stats.input_words,
        output.stats.output_words,
        output.stats.retained_percent,
        output.stats.segment_count,
        output.stats.total_duration_ms,
        bold(&path.display().to_string()),
    );
}

fn print_summary(cli: &Cli, summary: &DocumentSummary) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(summary).context("Failed to serialize summary")?
        );
        return Ok(());
    }

    let pages = match summary.page_count {
        edgequake_docedit::PageCount::Actual(n) => n.to_string(),
        edgequake_docedit::PageCount::Estimated(n) => format!("~{n} (estimated)"),
    };
    println!("Input:        {}", cli.input);
    println!("Pages:        {pages}");
    println!("Characters:   {}", summary.chars);
    println!("Words:        {}", summary.words);
    println!("Segments:     {}", summary.segments);
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read stdin")?;
    Ok(text)
}

async fn read_instruction(cli: &Cli) -> Result<String> {
    match (&cli.prompt, &cli.prompt_file) {
        (Some(p), _) => Ok(p.clone()),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read instruction from {:?}", path)),
        (None, None) => bail!("An instruction is required: pass --prompt or --prompt-file"),
    }
}

/// Map CLI args to `EditConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<EditConfig> {
    let mut builder = EditConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_words_per_segment(cli.max_words)
        .max_pages(cli.max_pages);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
