use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};
use plotters::prelude::*;
use ppg_lib::{
    detectors::{peak_detection, valley_detection},
    io::{
        sink::{CsvMetricSink, JsonLinesSink, MetricRecord, MetricSink},
        text as text_io,
    },
    metrics::{hrv::hrv_metrics, quality::rr_consistency},
    pipeline::{Outcome, Pipeline, PipelineConfig},
    plot::{figure_from_signal_with_peaks, Figure, Series},
    segments::NoiseBias,
    signal::{RRSeries, SamplingContext},
    synthetic::SyntheticPpg,
    window::WindowAccumulator,
};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "ppg",
    version,
    about = "PPG tools: filtering, beat detection and time-domain HRV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SourceArgs {
    /// Newline-delimited raw samples; stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, default_value_t = 25.0)]
    fs: f64,
    /// Recording window length; defaults to the length of the input
    #[arg(long)]
    duration_s: Option<f64>,
}

impl SourceArgs {
    fn context(&self, len: usize) -> Result<SamplingContext> {
        let ctx = match self.duration_s {
            Some(d) => SamplingContext::new(self.fs, d)?,
            None => SamplingContext::for_samples(self.fs, len.max(1))?,
        };
        Ok(ctx)
    }
}

/// Pipeline tunables: a TOML file, then individual overrides.
#[derive(Args, Clone, Default)]
struct ConfigArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    drop_zero_samples: bool,
    #[arg(long)]
    edge_trim: Option<usize>,
    #[arg(long)]
    smoothing_window: Option<usize>,
    #[arg(long)]
    valley_min_distance_s: Option<f64>,
    /// Search peaks on the smoothed signal without rejecting noisy cycles
    #[arg(long)]
    no_noise_elimination: bool,
    /// std,kurtosis,skew_low,skew_high
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    noise_bias: Option<Vec<f64>>,
    #[arg(long)]
    peak_threshold_factor: Option<f64>,
    #[arg(long)]
    peak_min_distance_s: Option<f64>,
    /// Samples left out at the start of the peak search
    #[arg(long)]
    peak_skip: Option<usize>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if self.drop_zero_samples {
            cfg.drop_zero_samples = true;
        }
        if let Some(v) = self.edge_trim {
            cfg.edge_trim = v;
        }
        if let Some(v) = self.smoothing_window {
            cfg.smoothing_window = v;
        }
        if let Some(v) = self.valley_min_distance_s {
            cfg.valley_min_distance_s = v;
        }
        if self.no_noise_elimination {
            cfg.noise_elimination = false;
        }
        if let Some(v) = &self.noise_bias {
            let arr: [f64; 4] = v
                .as_slice()
                .try_into()
                .context("--noise-bias takes exactly four values")?;
            cfg.noise_bias = NoiseBias::from(arr);
        }
        if let Some(v) = self.peak_threshold_factor {
            cfg.peak_threshold_factor = v;
        }
        if let Some(v) = self.peak_min_distance_s {
            cfg.peak_min_distance_s = v;
        }
        if let Some(v) = self.peak_skip {
            cfg.peak_skip = v;
        }
        cfg.validate()?;
        debug!("pipeline config: {:?}", cfg);
        Ok(cfg)
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SinkFormat {
    Csv,
    Jsonl,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full PPG → HRV pipeline over one recording window
    Pipeline {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Bandpass, trim and smooth raw samples; prints one value per line
    Filter {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Detect peaks in a real-valued series
    FindPeaks {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 25.0)]
        fs: f64,
        #[arg(long, default_value_t = 0.9)]
        threshold_factor: f64,
        #[arg(long, default_value_t = 0.4)]
        min_distance_s: f64,
    },
    /// Detect valleys in a real-valued series
    FindValleys {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 25.0)]
        fs: f64,
        #[arg(long, default_value_t = 0.4)]
        min_distance_s: f64,
    },
    /// Time-domain HRV from newline-delimited RR intervals (ms)
    Hrv {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Cut a long recording into fixed windows and emit one metric row per window
    Stream {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 25.0)]
        fs: f64,
        #[arg(long, default_value_t = 10.0)]
        window_s: f64,
        #[arg(long, value_enum, default_value = "csv")]
        format: SinkFormat,
        /// Write rows here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Also process the trailing window that never filled up
        #[arg(long)]
        include_partial: bool,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print a synthetic PPG recording, one raw sample per line
    Simulate {
        #[arg(long, default_value_t = 25.0)]
        fs: f64,
        #[arg(long, default_value_t = 60.0)]
        duration_s: f64,
        #[arg(long, default_value_t = 72.0)]
        heart_rate_bpm: f64,
        #[arg(long, default_value_t = 0.0)]
        rr_jitter_ms: f64,
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
    /// Render the cleaned signal with detected peaks to a PNG
    Plot {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Pipeline { source, config } => cmd_pipeline(&source, &config)?,
        Commands::Filter { source, config } => cmd_filter(&source, &config)?,
        Commands::FindPeaks {
            input,
            fs,
            threshold_factor,
            min_distance_s,
        } => cmd_find_peaks(input.as_deref(), fs, threshold_factor, min_distance_s)?,
        Commands::FindValleys {
            input,
            fs,
            min_distance_s,
        } => cmd_find_valleys(input.as_deref(), fs, min_distance_s)?,
        Commands::Hrv { input } => cmd_hrv(input.as_deref())?,
        Commands::Stream {
            input,
            fs,
            window_s,
            format,
            out,
            include_partial,
            config,
        } => cmd_stream(
            input.as_deref(),
            fs,
            window_s,
            format,
            out.as_deref(),
            include_partial,
            &config,
        )?,
        Commands::Simulate {
            fs,
            duration_s,
            heart_rate_bpm,
            rr_jitter_ms,
            noise,
            seed,
        } => cmd_simulate(SyntheticPpg {
            fs,
            duration_s,
            heart_rate_bpm,
            rr_jitter_ms,
            noise,
            seed,
            ..SyntheticPpg::default()
        })?,
        Commands::Plot {
            source,
            config,
            out,
        } => cmd_plot(&source, &config, &out)?,
    }
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}

fn read_raw_samples(input: Option<&Path>) -> Result<Vec<u32>> {
    match input {
        Some(path) => text_io::read_u32_samples(path),
        None => text_io::parse_u32_samples(&read_stdin()?),
    }
}

fn read_series(input: Option<&Path>) -> Result<Vec<f64>> {
    match input {
        Some(path) => text_io::read_f64_series(path),
        None => text_io::parse_f64_series(&read_stdin()?),
    }
}

fn build_pipeline(source: &SourceArgs, config: &ConfigArgs) -> Result<(Pipeline, Vec<u32>)> {
    let samples = read_raw_samples(source.input.as_deref())?;
    let ctx = source.context(samples.len())?;
    let pipeline = Pipeline::new(ctx, config.resolve()?)?;
    Ok((pipeline, samples))
}

fn cmd_pipeline(source: &SourceArgs, config: &ConfigArgs) -> Result<()> {
    let (pipeline, samples) = build_pipeline(source, config)?;
    let report = pipeline.run(&samples)?;
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn cmd_filter(source: &SourceArgs, config: &ConfigArgs) -> Result<()> {
    let (pipeline, samples) = build_pipeline(source, config)?;
    let smoothed = pipeline.preprocess(&samples)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for v in &smoothed.data {
        writeln!(out, "{v}")?;
    }
    out.flush()?;
    Ok(())
}

fn cmd_find_peaks(
    input: Option<&Path>,
    fs: f64,
    threshold_factor: f64,
    min_distance_s: f64,
) -> Result<()> {
    SamplingContext::new(fs, 1.0)?;
    let data = read_series(input)?;
    let events = peak_detection(&data, fs, threshold_factor, min_distance_s);
    println!("{}", serde_json::to_string(&events)?);
    Ok(())
}

fn cmd_find_valleys(input: Option<&Path>, fs: f64, min_distance_s: f64) -> Result<()> {
    SamplingContext::new(fs, 1.0)?;
    let data = read_series(input)?;
    let events = valley_detection(&data, fs, min_distance_s);
    println!("{}", serde_json::to_string(&events)?);
    Ok(())
}

#[derive(Serialize)]
struct HrvSummary {
    rr_count: usize,
    outcome: Outcome,
    rr_consistency: Option<f64>,
}

fn cmd_hrv(input: Option<&Path>) -> Result<()> {
    let values = match input {
        Some(path) => text_io::read_rr_ms(path)?,
        None => text_io::parse_rr_ms(&read_stdin()?)?,
    };
    let read = values.len();
    let rr = RRSeries::from_ms(values);
    if rr.len() < read {
        info!("discarded {} RR intervals outside 300-1500 ms", read - rr.len());
    }
    let summary = HrvSummary {
        rr_count: rr.len(),
        outcome: Outcome::from(hrv_metrics(&rr)),
        rr_consistency: rr_consistency(&rr),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn cmd_stream(
    input: Option<&Path>,
    fs: f64,
    window_s: f64,
    format: SinkFormat,
    out: Option<&Path>,
    include_partial: bool,
    config: &ConfigArgs,
) -> Result<()> {
    let ctx = SamplingContext::new(fs, window_s)?;
    let pipeline = Pipeline::new(ctx, config.resolve()?)?;
    let samples = read_raw_samples(input)?;

    let writer: Box<dyn Write> = match out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let mut sink: Box<dyn MetricSink> = match format {
        SinkFormat::Csv => Box::new(CsvMetricSink::new(writer)?),
        SinkFormat::Jsonl => Box::new(JsonLinesSink::new(writer)),
    };

    let mut acc = WindowAccumulator::new(&ctx);
    let mut consumed = 0usize;
    let mut windows = acc.extend(samples);
    if include_partial && acc.pending() > 0 {
        windows.push(acc.take_pending());
    }
    for window in &windows {
        consumed += window.len();
        let report = pipeline.run(window)?;
        let record = MetricRecord {
            timestamp_ms: (consumed as f64 * 1000.0 / fs).round() as u64,
            outcome: report.outcome,
        };
        sink.write(&record)?;
    }
    if acc.pending() > 0 {
        info!("{} trailing samples did not fill a window", acc.pending());
    }
    sink.flush()?;
    info!("processed {} windows", windows.len());
    Ok(())
}

fn cmd_simulate(sim: SyntheticPpg) -> Result<()> {
    SamplingContext::new(sim.fs, sim.duration_s)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for v in sim.generate() {
        writeln!(out, "{v}")?;
    }
    out.flush()?;
    Ok(())
}

fn cmd_plot(source: &SourceArgs, config: &ConfigArgs, out: &Path) -> Result<()> {
    let (pipeline, samples) = build_pipeline(source, config)?;
    let run = pipeline.run_with_signal(&samples)?;
    let fig = figure_from_signal_with_peaks("PPG peaks", &run.cleaned, &run.report.peaks, 4096);
    draw_plotters_figure(out, &fig)?;
    Ok(())
}

fn rgb(color: ppg_lib::plot::Color) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

fn draw_plotters_figure(path: &Path, fig: &Figure) -> Result<()> {
    let backend = BitMapBackend::new(path, (1000, 480));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let (x_min, mut x_max, mut y_min, mut y_max) = fig.bounds().unwrap_or((0.0, 1.0, 0.0, 1.0));
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    if y_max <= y_min {
        y_min -= 0.5;
        y_max += 0.5;
    }
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    {
        let mut mesh = chart.configure_mesh();
        if let Some(label) = &fig.x.label {
            mesh.x_desc(label.as_str());
        }
        if let Some(label) = &fig.y.label {
            mesh.y_desc(label.as_str());
        }
        mesh.draw()?;
    }
    for series in &fig.series {
        match series {
            Series::Line(line) => {
                let color = rgb(line.color);
                chart.draw_series(LineSeries::new(
                    line.points.iter().map(|p| (p[0], p[1])),
                    color.stroke_width(line.width),
                ))?;
            }
            Series::Markers(markers) => {
                let color = rgb(markers.color);
                chart.draw_series(
                    markers
                        .points
                        .iter()
                        .map(|p| Circle::new((p[0], p[1]), markers.radius, color.filled())),
                )?;
            }
        }
    }
    root.present()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
