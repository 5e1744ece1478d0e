use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use clinical_timeline::async_io::read_table_async;
use clinical_timeline::config::PipelineConfig;
use clinical_timeline::schema::{ADT_COLUMNS, VENTILATOR_COLUMNS};
use clinical_timeline::utils::io::write_parquet;
use clinical_timeline::utils::logging::{create_spinner, finish_progress_bar, log_table_summary};
use clinical_timeline::{RecordBatch, scan_batches, segment_batches, stitch_batches};

/// Derive intubation timepoints and ICU stays from Parquet EHR tables
#[derive(Parser, Debug)]
#[command(name = "clinical-timeline", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    options: GlobalOptions,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalOptions {
    /// JSON configuration file; command-line values take precedence
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Worker threads for per-encounter processing (defaults to the CPU count)
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Rows per record batch when reading, and per row group when writing
    #[arg(long, global = true)]
    batch_size: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find intubation timepoints in a ventilator table
    Intubation {
        /// Ventilator table: a Parquet file or a directory of Parquet files
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        /// Output Parquet file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Half-width of the scanning window in hours
        #[arg(long)]
        window_hours: Option<f64>,
    },

    /// Stitch ICU and stepdown segments of an ADT table into ranked stays
    IcuStays {
        /// ADT table: a Parquet file or a directory of Parquet files
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        /// Output Parquet file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Segments closer than this many hours are merged
        #[arg(long)]
        gap_hours: Option<f64>,

        /// Also write the per-segment grouping detail to this file
        #[arg(long, value_name = "FILE")]
        segments_output: Option<PathBuf>,
    },

    /// Run both derivations, reading the two tables concurrently
    All {
        /// Ventilator table
        #[arg(long, value_name = "PATH")]
        ventilator: PathBuf,

        /// ADT table
        #[arg(long, value_name = "PATH")]
        adt: PathBuf,

        /// Output file for intubation timepoints
        #[arg(long, value_name = "FILE")]
        intubation_output: PathBuf,

        /// Output file for ICU stays
        #[arg(long, value_name = "FILE")]
        icu_output: PathBuf,

        /// Half-width of the scanning window in hours
        #[arg(long)]
        window_hours: Option<f64>,

        /// Segments closer than this many hours are merged
        #[arg(long)]
        gap_hours: Option<f64>,

        /// Also write the per-segment grouping detail to this file
        #[arg(long, value_name = "FILE")]
        segments_output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = load_config(&cli.options)?;
    match &cli.command {
        Command::Intubation { window_hours, .. } => apply_overrides(&mut config, *window_hours, None),
        Command::IcuStays { gap_hours, .. } => apply_overrides(&mut config, None, *gap_hours),
        Command::All {
            window_hours,
            gap_hours,
            ..
        } => apply_overrides(&mut config, *window_hours, *gap_hours),
    }
    config.validate().context("Invalid configuration")?;

    let threads = config.effective_threads();
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("Failed to initialise the worker thread pool")?;
    info!(
        "Using {threads} worker threads, batch size {}",
        config.batch_size
    );

    let start = Instant::now();
    match cli.command {
        Command::Intubation { input, output, .. } => {
            let table = run_intubation(&input, &config).await?;
            write_table(&output, &table, &config)?;
        }
        Command::IcuStays {
            input,
            output,
            segments_output,
            ..
        } => {
            let batches = read_adt(&input, &config).await?;
            let (stays, segments) = run_icu_stays(batches, &config, segments_output.is_some()).await?;
            write_table(&output, &stays, &config)?;
            if let (Some(path), Some(segments)) = (segments_output, segments) {
                write_table(&path, &segments, &config)?;
            }
        }
        Command::All {
            ventilator,
            adt,
            intubation_output,
            icu_output,
            segments_output,
            ..
        } => {
            let with_segments = segments_output.is_some();
            let (timepoints, (stays, segments)) = tokio::try_join!(
                run_intubation(&ventilator, &config),
                async {
                    let batches = read_adt(&adt, &config).await?;
                    run_icu_stays(batches, &config, with_segments).await
                }
            )?;
            write_table(&intubation_output, &timepoints, &config)?;
            write_table(&icu_output, &stays, &config)?;
            if let (Some(path), Some(segments)) = (segments_output, segments) {
                write_table(&path, &segments, &config)?;
            }
        }
    }

    info!("Finished in {:?}", start.elapsed());
    Ok(())
}

fn load_config(options: &GlobalOptions) -> Result<PipelineConfig> {
    let mut config = match &options.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if options.threads.is_some() {
        config.threads = options.threads;
    }
    if let Some(batch_size) = options.batch_size {
        config.batch_size = batch_size;
    }
    Ok(config)
}

fn apply_overrides(config: &mut PipelineConfig, window_hours: Option<f64>, gap_hours: Option<f64>) {
    if let Some(hours) = window_hours {
        config.scan.window_hours = hours;
    }
    if let Some(hours) = gap_hours {
        config.stitch.gap_hours = hours;
    }
}

async fn run_intubation(input: &Path, config: &PipelineConfig) -> Result<RecordBatch> {
    let batches = read_table_async(input, &VENTILATOR_COLUMNS, config.batch_size)
        .await
        .with_context(|| format!("Failed to read ventilator table {}", input.display()))?;

    let scan = config.scan;
    let spinner = create_spinner(Some("Scanning ventilator windows"));
    let table = tokio::task::spawn_blocking(move || scan_batches(&batches, &scan))
        .await
        .context("Window scanner task failed")?
        .context("Failed to derive intubation timepoints")?;
    finish_progress_bar(&spinner, Some("Window scan complete"));

    log_table_summary("Intubation timepoints", &table);
    Ok(table)
}

async fn read_adt(input: &Path, config: &PipelineConfig) -> Result<Vec<RecordBatch>> {
    read_table_async(input, &ADT_COLUMNS, config.batch_size)
        .await
        .with_context(|| format!("Failed to read ADT table {}", input.display()))
}

async fn run_icu_stays(
    batches: Vec<RecordBatch>,
    config: &PipelineConfig,
    with_segments: bool,
) -> Result<(RecordBatch, Option<RecordBatch>)> {
    let stitch = config.stitch;
    let spinner = create_spinner(Some("Stitching ICU segments"));
    let (stays, segments) = tokio::task::spawn_blocking(move || {
        let stays = stitch_batches(&batches, &stitch)?;
        let segments = if with_segments {
            Some(segment_batches(&batches, &stitch)?)
        } else {
            None
        };
        Ok::<_, clinical_timeline::Error>((stays, segments))
    })
    .await
    .context("Interval stitcher task failed")?
    .context("Failed to derive ICU stays")?;
    finish_progress_bar(&spinner, Some("ICU stitching complete"));

    log_table_summary("ICU stays", &stays);
    if let Some(segments) = &segments {
        log_table_summary("ICU segments", segments);
    }
    Ok((stays, segments))
}

fn write_table(path: &Path, table: &RecordBatch, config: &PipelineConfig) -> Result<()> {
    write_parquet(path, table, config.batch_size)
        .with_context(|| format!("Failed to write {}", path.display()))
}
