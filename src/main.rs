//! CLI Entry Point for percept-daq
//!
//! Provides command-line interface for:
//! - Timestamping a recorded packet stream and writing CSV
//! - Checking the effective configuration
//!
//! # Usage
//!
//! Timestamp a JSON-lines capture:
//! ```bash
//! percept-daq timestamp capture.jsonl --output samples.csv
//! ```
//!
//! Timestamp a packet log document (settings embedded):
//! ```bash
//! percept-daq timestamp session.json --config config/percept_daq.toml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use percept_daq::config::{AppConfig, PacketErrorPolicy, DEFAULT_CONFIG_PATH};
use percept_daq::logging;
use percept_daq::metadata::SessionMetadataBuilder;
use percept_daq::packet::{DeviceSettings, Packet};
use percept_daq::sink::{CsvSink, SampleSink};
use percept_daq::source::{JsonLinesSource, PacketLog};
use percept_daq::timing::{SequencePolicy, StreamDriver, StreamStats};
use percept_daq::AppResult;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Records buffered before each sink write.
const WRITE_BATCH: usize = 4096;

#[derive(Parser)]
#[command(name = "percept-daq")]
#[command(about = "Per-sample timestamp reconstruction for neurostimulator telemetry", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timestamp a packet capture (.jsonl/.ndjson lines or a .json packet log)
    Timestamp {
        /// Input capture file
        input: PathBuf,

        /// Output CSV file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Time-zone offset in seconds, overriding config and packet log settings
        #[arg(long, allow_hyphen_values = true)]
        timezone_offset: Option<f64>,

        /// Sequence contiguity policy (ignore, warn, reject)
        #[arg(long, value_parser = parse_sequence_policy)]
        sequence_policy: Option<SequencePolicy>,

        /// Skip packets that cannot be timestamped instead of aborting
        #[arg(long)]
        skip_bad_packets: bool,
    },

    /// Validate and print the effective configuration
    CheckConfig,
}

fn parse_sequence_policy(value: &str) -> Result<SequencePolicy, String> {
    match value.to_ascii_lowercase().as_str() {
        "ignore" => Ok(SequencePolicy::Ignore),
        "warn" => Ok(SequencePolicy::Warn),
        "reject" => Ok(SequencePolicy::Reject),
        other => Err(format!(
            "unknown sequence policy '{other}' (expected ignore, warn or reject)"
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = AppConfig::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match cli.command {
        Commands::Timestamp {
            input,
            output,
            timezone_offset,
            sequence_policy,
            skip_bad_packets,
        } => {
            if let Some(output) = output {
                config.output.path = Some(output);
            }
            if let Some(policy) = sequence_policy {
                config.stream.sequence_policy = policy;
            }
            if skip_bad_packets {
                config.stream.on_packet_error = PacketErrorPolicy::Skip;
            }
            config.validate()?;
            logging::init_from_config(&config).map_err(anyhow::Error::msg)?;
            run_timestamp(input, timezone_offset, config).await
        }
        Commands::CheckConfig => {
            config.validate()?;
            let mut stdout = tokio::io::stdout();
            let json = serde_json::to_string_pretty(&config)?;
            tokio::io::AsyncWriteExt::write_all(&mut stdout, json.as_bytes()).await?;
            tokio::io::AsyncWriteExt::write_all(&mut stdout, b"\n").await?;
            Ok(())
        }
    }
}

async fn run_timestamp(
    input: PathBuf,
    timezone_offset: Option<f64>,
    config: AppConfig,
) -> Result<()> {
    info!(input = %input.display(), "timestamping capture");
    let stats = tokio::task::spawn_blocking(move || timestamp_file(&input, timezone_offset, &config))
        .await
        .context("timestamping task panicked")??;

    info!(
        packets = stats.packets_processed,
        rejected = stats.packets_rejected,
        resyncs = stats.resyncs,
        rate_changes = stats.rate_changes,
        discontinuities = stats.sequence_discontinuities,
        records = stats.records_emitted,
        "stream complete"
    );
    Ok(())
}

fn is_json_lines(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("jsonl") | Some("ndjson")
    )
}

fn timestamp_file(input: &Path, timezone_offset: Option<f64>, config: &AppConfig) -> Result<StreamStats> {
    let source_name = input.display().to_string();
    if is_json_lines(input) {
        let file = File::open(input).with_context(|| format!("opening {source_name}"))?;
        let settings = DeviceSettings::new(
            timezone_offset.unwrap_or(config.device.timezone_offset_secs),
        );
        run_stream(&source_name, settings, JsonLinesSource::new(BufReader::new(file)), config)
    } else {
        let log = PacketLog::load(input).with_context(|| format!("reading {source_name}"))?;
        let (mut settings, packets) = log.into_parts();
        if let Some(offset) = timezone_offset {
            settings.timezone_offset_secs = offset;
        }
        run_stream(&source_name, settings, packets, config)
    }
}

fn open_output(config: &AppConfig) -> Result<Box<dyn Write>> {
    match &config.output.path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(std::io::stdout().lock())),
    }
}

fn run_stream<I>(
    source_name: &str,
    settings: DeviceSettings,
    packets: I,
    config: &AppConfig,
) -> Result<StreamStats>
where
    I: Iterator<Item = AppResult<Packet>>,
{
    settings.validate()?;
    let options = config.stream_options();
    let metadata = SessionMetadataBuilder::new()
        .source(source_name)
        .timezone_offset_secs(settings.timezone_offset_secs)
        .resync_threshold_secs(options.resync_threshold_secs)
        .sequence_policy(options.sequence_policy)
        .build();
    let mut sink = CsvSink::new(open_output(config)?, &metadata, config.output.include_utc)?;

    let mut stream = StreamDriver::new(settings, options).stream(packets);
    let mut batch = Vec::with_capacity(WRITE_BATCH);
    for item in stream.by_ref() {
        match item {
            Ok(record) => {
                batch.push(record);
                if batch.len() >= WRITE_BATCH {
                    sink.write(&batch)?;
                    batch.clear();
                }
            }
            Err(err)
                if err.is_packet_scoped()
                    && config.stream.on_packet_error == PacketErrorPolicy::Skip =>
            {
                warn!(error = %err, "skipping packet");
            }
            Err(err) => return Err(err.into()),
        }
    }
    sink.write(&batch)?;
    sink.finish()?;
    Ok(*stream.stats())
}
