use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use scenecut::{
    CommandAnalyzer, ExportService, ExtractionConfig, FfmpegLogLevel, FrameSource,
    JsonFileStore, MediaFile, OperationType, ProgressCallback, ProgressInfo, SamplingOptions,
    SamplingPlan, SceneCatalog, SessionController, SessionStore, SourceFile, format_timestamp,
};

const CLI_AFTER_HELP: &str = "Examples:\n  scenecut probe input.mp4 --json\n  scenecut extract input.mp4 --out scenes --interval 2 --max-frames 40 --tsv --archive --progress\n  scenecut extract input.mp4 --out scenes --analyzer-cmd describe-frame --select 1,4-6\n  scenecut sessions --store ~/.scenecut\n  scenecut completions zsh > _scenecut";

#[derive(Debug, Parser)]
#[command(
    name = "scenecut",
    version,
    about = "Sample a video into scenes, describe them, and export the results",
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
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while extracting and analyzing.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print source metadata and the sampling plan.
    #[command(
        about = "Print video metadata and sampling plan",
        after_help = "Examples:\n  scenecut probe input.mp4\n  scenecut probe input.mp4 --interval 0.5 --max-frames 120 --json"
    )]
    Probe {
        /// Input video path.
        input: PathBuf,
        /// Desired seconds between scenes.
        #[arg(long, default_value_t = 1.0)]
        interval: f64,
        /// Maximum number of scenes.
        #[arg(long, default_value_t = 60)]
        max_frames: u32,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Extract scenes, optionally analyze them, and export.
    #[command(
        about = "Extract scenes from a video",
        after_help = "Examples:\n  scenecut extract input.mp4 --out scenes --tsv\n  scenecut extract input.mp4 --out scenes --analyzer-cmd describe-frame --analyzer-arg --json --archive"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Output directory for scene images and reports.
        #[arg(long)]
        out: PathBuf,
        /// Desired seconds between scenes.
        #[arg(long, default_value_t = 1.0)]
        interval: f64,
        /// Maximum number of scenes.
        #[arg(long, default_value_t = 60)]
        max_frames: u32,
        /// JPEG quality in (0, 1].
        #[arg(long, default_value_t = 0.8)]
        quality: f32,
        /// Program that reads a JPEG on stdin and prints {"description", "tags"} JSON.
        #[arg(long)]
        analyzer_cmd: Option<PathBuf>,
        /// Extra argument for the analyzer program (repeatable).
        #[arg(long, allow_hyphen_values = true)]
        analyzer_arg: Vec<String>,
        /// Scene numbers to export, e.g. "1,3,5-8". Defaults to all scenes.
        #[arg(long)]
        select: Option<String>,
        /// Also write a TSV report of all scenes.
        #[arg(long)]
        tsv: bool,
        /// Also write a ZIP archive of the selected scenes.
        #[arg(long)]
        archive: bool,
        /// Persist the session into this store directory.
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// List persisted sessions, newest first.
    #[command(about = "List stored sessions")]
    Sessions {
        /// Store directory.
        #[arg(long)]
        store: PathBuf,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    match value.to_ascii_lowercase().as_str() {
        "quiet" => Some(FfmpegLogLevel::Quiet),
        "fatal" | "panic" => Some(FfmpegLogLevel::Fatal),
        "error" => Some(FfmpegLogLevel::Error),
        "warning" | "warn" => Some(FfmpegLogLevel::Warning),
        "info" | "verbose" => Some(FfmpegLogLevel::Info),
        "debug" | "trace" => Some(FfmpegLogLevel::Debug),
        _ => None,
    }
}

/// Parse a scene list like `1,3,5-8` into sorted, deduplicated numbers.
/// Ranges stop at `last_scene`; numbers past it stay so they can be
/// reported as missing.
fn parse_selection(value: &str, last_scene: u32) -> Result<Vec<u32>, Box<dyn std::error::Error>> {
    let mut numbers = Vec::new();
    let mut named = false;
    for part in value.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        named = true;
        match part.split_once('-') {
            Some((start, end)) => {
                let start = start.trim().parse::<u32>()?;
                let end = end.trim().parse::<u32>()?;
                if start > end {
                    return Err(format!("invalid scene range: {part}").into());
                }
                numbers.extend(start..=end.min(last_scene));
            }
            None => numbers.push(part.parse::<u32>()?),
        }
    }
    if !named {
        return Err("--select must name at least one scene".into());
    }
    numbers.sort_unstable();
    numbers.dedup();
    Ok(numbers)
}

fn apply_selection(catalog: &mut SceneCatalog, numbers: &[u32]) -> usize {
    catalog.deselect_all();
    let ids: Vec<_> = catalog
        .iter()
        .filter(|scene| numbers.binary_search(&scene.scene_number).is_ok())
        .map(|scene| scene.id)
        .collect();
    for id in &ids {
        catalog.toggle_selection(id);
    }
    ids.len()
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed = parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
        scenecut::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

/// Drives one indicatif bar from library progress callbacks.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let label = match info.operation {
            OperationType::FrameExtraction => "extracting",
            OperationType::SceneAnalysis => "analyzing",
            OperationType::SessionSave => "saving",
            _ => "working",
        };
        if self.bar.is_finished() || self.bar.length() != Some(info.total) {
            self.bar.reset();
            self.bar.set_length(info.total);
        }
        self.bar.set_position(info.current);
        match info.timestamp {
            Some(timestamp) => self
                .bar
                .set_message(format!("{label} {}", format_timestamp(timestamp))),
            None => self.bar.set_message(label),
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Probe {
            input,
            interval,
            max_frames,
            json,
        } => {
            let media = MediaFile::open(&input)?;
            let metadata = media.metadata()?;
            let plan = SamplingPlan::compute(
                metadata.duration,
                &SamplingOptions::new(interval, max_frames, 1.0),
            )?;

            if json {
                let payload = json!({
                    "duration_seconds": metadata.duration,
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "codec": metadata.codec,
                    "plan": {
                        "natural_count": plan.natural_count,
                        "adjusted_interval": plan.adjusted_interval,
                        "total_frames": plan.total_frames,
                    },
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "Duration: {:.3}s ({})",
                    metadata.duration,
                    format_timestamp(metadata.duration)
                );
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec,
                );
                println!(
                    "Plan: {} scene(s) every {:.3}s (natural count {})",
                    plan.total_frames, plan.adjusted_interval, plan.natural_count,
                );
            }
        }
        Commands::Extract {
            input,
            out,
            interval,
            max_frames,
            quality,
            analyzer_cmd,
            analyzer_arg,
            select,
            tsv,
            archive,
            store,
        } => {
            if let Some(value) = select.as_deref() {
                parse_selection(value, 0)?;
            }

            if out.exists() {
                if !cli.global.overwrite {
                    return Err(format!(
                        "output directory already exists: {} (use --overwrite)",
                        out.display()
                    )
                    .into());
                }
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("writing into existing directory {}", out.display()).yellow()
                );
            }
            fs::create_dir_all(&out)?;

            let progress = if cli.global.progress {
                Some(Arc::new(TerminalProgress::new()?))
            } else {
                None
            };

            let mut controller = SessionController::new();
            let mut config = ExtractionConfig::new();
            if let Some(progress) = &progress {
                controller = controller.with_progress(progress.clone());
                config = config.with_progress(progress.clone());
            }

            let source = SourceFile::from_path(&input)?;
            let media = MediaFile::open(&input)?;
            let options = SamplingOptions::new(interval, max_frames, quality);
            let total = controller.extract(source, media, &options, &config)?.total_scenes();

            if let Some(program) = analyzer_cmd {
                let analyzer = CommandAnalyzer::new(program).with_args(analyzer_arg);
                let summary = controller.run_analysis(&analyzer)?;
                if summary.failed > 0 {
                    eprintln!(
                        "{} {}",
                        "warning:".yellow().bold(),
                        format!("analysis failed for {} scene(s)", summary.failed).yellow()
                    );
                }
                if cli.global.verbose {
                    eprintln!(
                        "analyzed {}/{} scene(s)",
                        summary.completed, summary.total
                    );
                }
            }

            if let Some(progress) = &progress {
                progress.finish();
            }

            let session = controller
                .session_mut()
                .ok_or("extraction produced no session")?;
            let base_name = session.source().stem().to_string();

            let last_scene = u32::try_from(session.total_scenes()).unwrap_or(u32::MAX);
            let selection = select
                .as_deref()
                .map(|value| parse_selection(value, last_scene))
                .transpose()?;

            match &selection {
                Some(numbers) => {
                    let selected = apply_selection(session.catalog_mut(), numbers);
                    if selected < numbers.len() {
                        eprintln!(
                            "{} {}",
                            "warning:".yellow().bold(),
                            format!(
                                "{} selected scene number(s) do not exist",
                                numbers.len() - selected
                            )
                            .yellow()
                        );
                    }
                }
                None => session.catalog_mut().select_all(),
            }

            let export = ExportService::new();
            let catalog = session.catalog();
            let written = export.export_directory(catalog.selected(), &out)?;

            if tsv {
                let report_path = out.join(ExportService::tsv_file_name(&base_name));
                ensure_writable_path(&report_path, cli.global.overwrite)?;
                export.export_tsv(catalog, &out, &base_name)?;
            }

            if archive {
                let archive_path = out.join(format!("{base_name}_scenes.zip"));
                ensure_writable_path(&archive_path, cli.global.overwrite)?;
                export.export_archive(catalog.selected(), &archive_path)?;
            }

            if let Some(store_dir) = store {
                let mut store = JsonFileStore::open(store_dir)?;
                if let Some(progress) = &progress {
                    store = store.with_progress(progress.clone());
                }
                let id = store.save_session(session)?;
                if let Some(progress) = &progress {
                    progress.finish();
                }
                println!("Session: {id}");
            }

            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Extracted {total} scene(s), wrote {} to {}",
                    written.len(),
                    out.display()
                )
                .green()
            );
        }
        Commands::Sessions { store, json } => {
            let store = JsonFileStore::open(store)?;
            let sessions = store.list_sessions()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            } else if sessions.is_empty() {
                println!("No sessions in {}", store.root().display());
            } else {
                for summary in &sessions {
                    println!(
                        "{}  {}  {} scene(s)  {}  [{}]",
                        summary.id,
                        summary.source.name,
                        summary.total_scenes,
                        format_timestamp(summary.duration),
                        summary.analysis_status,
                    );
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "scenecut", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
