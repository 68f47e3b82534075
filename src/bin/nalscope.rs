use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use nalscope::{
    AnalysisOptions, Analyzer, ComparisonTable, DetailedComparison, FfmpegTools, FileAnalysis,
    HeaderComparison, NalUnitType, ProgressCallback, ProgressInfo, ReferencePolicy, ToolPaths,
    config::{DEFAULT_FRAME_RATE, DEFAULT_GOP_PREVIEW, DEFAULT_TOP_FRAMES},
    nal,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  nalscope analyze x264.mp4 nvenc.mp4 --framerate 30\n  nalscope analyze x264.mp4 nvenc.mp4 --detailed --headers\n  nalscope --json analyze clip.mkv\n  nalscope nal stream.h264 --histogram\n  nalscope completions zsh > _nalscope";

#[derive(Debug, Parser)]
#[command(
    name = "nalscope",
    version,
    about = "Compare the structure of H.264 encodes: GOPs, bitrate, reference frames",
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
    /// Show debug logging output (RUST_LOG takes precedence).
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while analyzing several files.
    #[arg(long, global = true)]
    progress: bool,

    /// Print results as JSON instead of text reports.
    #[arg(long, global = true)]
    json: bool,

    /// Path to the ffprobe executable.
    #[arg(long, global = true)]
    ffprobe: Option<PathBuf>,

    /// Path to the ffmpeg executable.
    #[arg(long, global = true)]
    ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum RefPolicy {
    /// NAL types 1, 2 and 5 are reference pictures.
    #[default]
    NalType,
    /// Slices with a non-zero nal_ref_idc are reference pictures.
    RefIdc,
}

impl From<RefPolicy> for ReferencePolicy {
    fn from(policy: RefPolicy) -> Self {
        match policy {
            RefPolicy::NalType => ReferencePolicy::NalType,
            RefPolicy::RefIdc => ReferencePolicy::RefIdc,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze one or more video files and compare them.
    #[command(
        about = "Analyze and compare video files",
        after_help = "Examples:\n  nalscope analyze a.mp4 b.mp4\n  nalscope analyze a.mp4 b.mp4 -f 30 --detailed --headers"
    )]
    Analyze {
        /// Input video files.
        #[arg(required = true)]
        videos: Vec<PathBuf>,

        /// Frame rate used for bitrate and GOP duration calculations.
        #[arg(short = 'f', long, default_value_t = DEFAULT_FRAME_RATE)]
        framerate: f64,

        /// Probe encoder settings and I/P frame size statistics.
        #[arg(long)]
        detailed: bool,

        /// Trace and compare SPS, PPS and slice headers.
        #[arg(long)]
        headers: bool,

        /// Number of largest frames to list.
        #[arg(long, default_value_t = DEFAULT_TOP_FRAMES)]
        top: usize,

        /// Number of GOPs to preview.
        #[arg(long, default_value_t = DEFAULT_GOP_PREVIEW)]
        gops: usize,

        /// How slice referenceability is decided.
        #[arg(long, value_enum, default_value_t = RefPolicy::NalType)]
        ref_policy: RefPolicy,
    },

    /// List the NAL units of a raw Annex-B stream.
    #[command(
        about = "Scan a raw H.264 elementary stream",
        after_help = "Examples:\n  nalscope nal stream.h264 --limit 20\n  nalscope nal stream.h264 --histogram"
    )]
    Nal {
        /// Annex-B elementary stream file.
        input: PathBuf,

        /// Print unit counts per NAL type instead of individual units.
        #[arg(long)]
        histogram: bool,

        /// Maximum number of units to list.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn tool_paths(global: &GlobalOptions) -> ToolPaths {
    let mut paths = ToolPaths::from_env();
    if let Some(ffprobe) = &global.ffprobe {
        paths = paths.with_ffprobe(ffprobe.clone());
    }
    if let Some(ffmpeg) = &global.ffmpeg {
        paths = paths.with_ffmpeg(ffmpeg.clone());
    }
    paths
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(total: usize) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total as u64);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        if let Some(file) = info.current_file.as_ref().and_then(|path| path.file_name()) {
            self.bar.set_message(file.to_string_lossy().into_owned());
        }
        if info.total.is_some_and(|total| info.current >= total) {
            self.bar.finish_and_clear();
        }
    }
}

fn print_comparisons(analyses: &[FileAnalysis], detailed: bool, headers: bool) {
    if let Some(table) = ComparisonTable::new(analyses) {
        println!();
        print!("{table}");
    }
    if detailed {
        if let Some(table) = DetailedComparison::new(analyses) {
            println!();
            print!("{table}");
        }
    }
    if headers {
        match HeaderComparison::new(analyses) {
            Some(comparison) => {
                println!();
                print!("{comparison}");
                println!();
                println!(
                    "{} {} header field(s) differ",
                    "summary:".cyan().bold(),
                    comparison.difference_count()
                );
            }
            None if analyses.len() >= 2 => eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                "header comparison needs traces from at least two files".yellow()
            ),
            None => {}
        }
    }
}

fn run_analyze(
    global: &GlobalOptions,
    videos: &[PathBuf],
    options: AnalysisOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let detailed = options.detailed();
    let headers = options.headers();
    let options = if global.progress && videos.len() > 1 {
        options.with_progress(Arc::new(TerminalProgress::new(videos.len())?))
    } else {
        options
    };
    let analyzer = Analyzer::new(options)?;
    let tools = FfmpegTools::new(tool_paths(global));

    let mut analyses = Vec::new();
    let mut failures = Vec::new();
    for (path, result) in videos.iter().zip(analyzer.analyze_files(&tools, videos)) {
        match result {
            Ok(analysis) => analyses.push(analysis),
            Err(error) => {
                eprintln!("{} {}", "error:".red().bold(), error.to_string().red());
                failures.push((path, error));
            }
        }
    }

    if analyses.is_empty() {
        return Err("no files could be analyzed".into());
    }

    if global.json {
        let detailed_comparison = detailed.then(|| DetailedComparison::new(&analyses)).flatten();
        let header_comparison = headers.then(|| HeaderComparison::new(&analyses)).flatten();
        let payload = json!({
            "files": analyses,
            "failures": failures
                .iter()
                .map(|(path, error)| json!({ "path": path, "error": error.to_string() }))
                .collect::<Vec<_>>(),
            "comparison": ComparisonTable::new(&analyses),
            "detailed_comparison": detailed_comparison,
            "header_comparison": header_comparison,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    for analysis in &analyses {
        print!("{analysis}");
    }
    print_comparisons(&analyses, detailed, headers);

    if !failures.is_empty() {
        eprintln!(
            "{} {} of {} file(s) failed",
            "warning:".yellow().bold(),
            failures.len(),
            videos.len()
        );
    }
    Ok(())
}

fn run_nal(
    global: &GlobalOptions,
    input: &Path,
    histogram: bool,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;

    if histogram {
        let counts: Vec<(u8, NalUnitType, u64)> = nal::type_histogram(&data)
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(nal_type, count)| {
                let nal_type = nal_type as u8;
                (nal_type, NalUnitType::from_type_id(nal_type), *count)
            })
            .collect();

        if global.json {
            let payload: Vec<_> = counts
                .iter()
                .map(|(nal_type, unit_type, count)| {
                    json!({ "type": nal_type, "name": unit_type.to_string(), "count": count })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&payload)?);
        } else {
            println!("{:<6} {:<28} {:>10}", "Type", "Name", "Count");
            println!("{}", "-".repeat(46));
            for (nal_type, unit_type, count) in counts {
                println!("{nal_type:<6} {:<28} {count:>10}", unit_type.to_string());
            }
        }
        return Ok(());
    }

    let units = nal::scan(&data).take(limit.unwrap_or(usize::MAX));
    if global.json {
        let payload: Vec<_> = units
            .map(|unit| {
                json!({
                    "offset": unit.offset,
                    "length": unit.length,
                    "type": unit.nal_type,
                    "name": unit.unit_type().to_string(),
                    "ref_idc": unit.ref_idc(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "{:<12} {:<10} {:<6} {:<8} {}",
            "Offset", "Length", "Type", "RefIdc", "Name"
        );
        println!("{}", "-".repeat(60));
        for unit in units {
            println!(
                "{:<12} {:<10} {:<6} {:<8} {}",
                unit.offset,
                unit.length,
                unit.nal_type,
                unit.ref_idc(),
                unit.unit_type()
            );
        }
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match cli.command {
        Commands::Analyze {
            videos,
            framerate,
            detailed,
            headers,
            top,
            gops,
            ref_policy,
        } => {
            let options = AnalysisOptions::new()
                .with_frame_rate(framerate)
                .with_detailed(detailed)
                .with_headers(headers)
                .with_top_frames(top)
                .with_gop_preview(gops)
                .with_reference_policy(ref_policy.into());
            run_analyze(&cli.global, &videos, options)?;
        }
        Commands::Nal {
            input,
            histogram,
            limit,
        } => {
            run_nal(&cli.global, &input, histogram, limit)?;
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "nalscope", &mut std::io::stdout());
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
