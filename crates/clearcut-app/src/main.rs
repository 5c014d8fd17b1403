//! ClearCut - accessible video editing from the command line
//!
//! Entry point: settings, logging and the subcommands that drive the
//! editing core.

mod ops;
mod settings;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clearcut_core::format_timestamp;
use clearcut_media::{spawn_export, ExportFormat, ExportJob, MediaBackend};
use clearcut_timeline::{ContextRegistry, EditState, EditingContext, ProjectFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ops::{EditOp, Tabs};
use settings::Settings;

#[derive(Parser)]
#[command(name = "clearcut")]
#[command(about = "ClearCut - non-destructive video editing with undo and exact time mapping")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a project from a media file
    New {
        /// Media file to edit
        media: PathBuf,

        /// Project file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Source duration in seconds (skips probing)
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Print the segments of a project
    Show {
        /// Project file path
        project: PathBuf,
    },

    /// Apply edit operations to a project
    Edit {
        /// Project file path
        project: PathBuf,

        /// Operations, applied in order (cut:10-20, copy:a-b, paste:t,
        /// delete:a-b, insert:pos:file:start-end, undo, redo, use:from,
        /// use:project)
        #[arg(required = true)]
        ops: Vec<EditOp>,

        /// Second project to copy material from after `use:from` (never saved)
        #[arg(long)]
        from: Option<PathBuf>,

        /// Write the result here instead of back to the project
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Apply and print, but do not save
        #[arg(long)]
        dry_run: bool,
    },

    /// Map a time between source and timeline
    Map {
        /// Project file path
        project: PathBuf,

        /// Time in seconds
        time: f64,

        /// Treat `time` as a time in this source file instead of the default one
        #[arg(long, conflicts_with = "to_source")]
        source: Option<String>,

        /// Treat `time` as timeline time and map it back to its source
        #[arg(long)]
        to_source: bool,
    },

    /// Render a project to a video file
    Export {
        /// Project file path
        project: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Encoder preset (defaults to the settings file)
        #[arg(long, value_enum)]
        preset: Option<Preset>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    H264,
    Vp9,
}

impl Preset {
    fn format(self) -> ExportFormat {
        match self {
            Self::H264 => ExportFormat::h264(),
            Self::Vp9 => ExportFormat::vp9_web(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    // Initialize logging: RUST_LOG wins, then --verbose, then settings.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(&settings.log_filter)
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::New {
            media,
            output,
            duration,
        } => new_project(&settings, &media, &output, duration),
        Commands::Show { project } => {
            let ctx = load_project(&settings, &project)?;
            print_timeline(&ctx);
            Ok(())
        }
        Commands::Edit {
            project,
            ops,
            from,
            output,
            dry_run,
        } => edit_project(
            &settings,
            &project,
            &ops,
            from.as_deref(),
            output.as_deref(),
            dry_run,
        ),
        Commands::Map {
            project,
            time,
            source,
            to_source,
        } => map_time(&settings, &project, time, source.as_deref(), to_source),
        Commands::Export {
            project,
            output,
            preset,
        } => {
            let format = preset.map_or_else(|| settings.export.clone(), Preset::format);
            export_project(&settings, &project, &output, format)
        }
    }
}

fn load_project(settings: &Settings, path: &Path) -> Result<EditingContext> {
    let file = ProjectFile::load_from_file(path)
        .with_context(|| format!("Failed to open project {}", path.display()))?;
    let mut ctx = EditingContext::with_history_depth(project_name(path), settings.history_depth);
    file.restore_into(&mut ctx)?;
    Ok(ctx)
}

fn project_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string())
}

fn new_project(
    settings: &Settings,
    media: &Path,
    output: &Path,
    duration: Option<f64>,
) -> Result<()> {
    let duration = match duration {
        Some(d) => d,
        None => settings
            .backend()
            .probe_duration(media)
            .with_context(|| format!("Could not read duration of {}", media.display()))?,
    };

    let mut ctx = EditingContext::with_history_depth(project_name(output), settings.history_depth);
    ctx.load_media(media.to_string_lossy(), duration)?;
    ProjectFile::from_context(&ctx).save_to_file(output)?;

    println!(
        "Created {} ({} of {})",
        output.display(),
        format_timestamp(duration),
        media.display()
    );
    Ok(())
}

fn edit_project(
    settings: &Settings,
    project: &Path,
    ops: &[EditOp],
    from: Option<&Path>,
    output: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let mut registry = ContextRegistry::with_history_depth(settings.history_depth);
    let from = match from {
        Some(path) => Some(registry.insert(load_project(settings, path)?)),
        None => None,
    };
    let tabs = Tabs {
        project: registry.insert(load_project(settings, project)?),
        from,
    };

    for (i, op) in ops.iter().enumerate() {
        op.apply(&mut registry, &tabs)
            .with_context(|| format!("Operation {} ({}) failed", i + 1, op))?;
        println!("{}", op);
    }

    registry.set_active(tabs.project)?;
    let ctx = registry
        .active_mut()
        .context("Project was closed during editing")?;
    print_timeline(ctx);

    if dry_run {
        info!("Dry run, project not saved");
        return Ok(());
    }
    if ctx.state() != EditState::Edited {
        println!("No net change; project left as is");
        return Ok(());
    }

    let target = output.unwrap_or(project);
    ProjectFile::from_context(ctx).save_to_file(target)?;
    ctx.mark_saved();
    println!("Saved {}", target.display());
    Ok(())
}

fn map_time(
    settings: &Settings,
    project: &Path,
    time: f64,
    source: Option<&str>,
    to_source: bool,
) -> Result<()> {
    let ctx = load_project(settings, project)?;
    let mapper = ctx.timeline().mapper();

    if to_source {
        match mapper.timeline_to_source(time) {
            Some(pos) => println!(
                "{} -> {} in {}",
                format_timestamp(time),
                format_timestamp(pos.time),
                pos.source_file.as_deref().unwrap_or("<no source>")
            ),
            None => println!("{} is past the end of the timeline", format_timestamp(time)),
        }
        return Ok(());
    }

    let mapped = match source {
        Some(file) => mapper.source_to_timeline_in(file, time),
        None => mapper.source_to_timeline(time),
    };
    match mapped {
        Some(t) => println!("{} -> {}", format_timestamp(time), format_timestamp(t)),
        None => println!("{} was removed from the timeline", format_timestamp(time)),
    }
    Ok(())
}

fn export_project(
    settings: &Settings,
    project: &Path,
    output: &Path,
    format: ExportFormat,
) -> Result<()> {
    let ctx = load_project(settings, project)?;
    let job = ExportJob::from_timeline(ctx.timeline(), output, format)?;
    if job.stream_copy {
        info!("Timeline is unedited, copying streams");
    }

    let backend: Arc<dyn MediaBackend> = Arc::new(settings.backend());
    let handle = spawn_export(backend, job)?;

    let mut last_percent = None;
    let result = handle.wait(|progress| {
        let percent = (progress.fraction() * 100.0).floor() as u32;
        if last_percent != Some(percent) {
            last_percent = Some(percent);
            eprint!("\rExporting... {:3}%", percent);
        }
    });
    eprintln!();

    match result {
        Ok(()) => {
            println!("Exported {}", output.display());
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Export did not complete");
            bail!("Export of {} failed: {}", output.display(), e)
        }
    }
}

fn print_timeline(ctx: &EditingContext) {
    let timeline = ctx.timeline();
    println!(
        "{} [{:?}] {} segment(s), {}",
        ctx.name,
        ctx.state(),
        timeline.segment_count(),
        format_timestamp(timeline.total_duration())
    );
    for (i, (segment, span)) in timeline.segment_spans().enumerate() {
        println!(
            "{:>4}  {} - {}  <- {} {} - {}",
            i + 1,
            format_timestamp(span.start),
            format_timestamp(span.end),
            segment
                .effective_source(timeline.source_file())
                .unwrap_or("<no source>"),
            format_timestamp(segment.start),
            format_timestamp(segment.end),
        );
    }
}
