//! jetstream command-line tool.
//!
//! Fetches reanalysis wind data for a date and pressure level and renders it
//! as a map:
//! - `run`: resolve, fetch and render
//! - `fetch`: resolve and fetch only
//! - `render`: render an existing data file
//! - `inspect`: list the variables of a data file

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use jet_common::time::parse_date;
use jet_common::{JetError, JetResult, PressureLevel, Region};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use jetstream::pipeline::{cache_dir, locate_data_file};
use jetstream::{
    AppConfig, Fetcher, Output, RenderJob, RenderSettings, RequestDescriptor, RequestOptions,
    Resolver,
};

#[derive(Parser, Debug)]
#[command(name = "jetstream")]
#[command(version, about = "Fetch reanalysis wind data and render jet stream maps")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "JETSTREAM_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter directive (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "info", env = "JETSTREAM_LOG_LEVEL")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch data for a date and render the map
    Run(RunArgs),
    /// Fetch data for a date without rendering
    Fetch(RequestArgs),
    /// Render a map from an existing data file
    Render(RenderArgs),
    /// List the variables of a data file
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Date to fetch (YYYY-MM-DD)
    #[arg(short, long)]
    date: String,

    /// Last date of a range (YYYY-MM-DD)
    #[arg(long)]
    until: Option<String>,

    /// Pressure level in hPa (250 is the jet stream)
    #[arg(short, long, default_value = "250")]
    level: String,

    /// Region preset or west,south,east,north
    #[arg(short, long, default_value = "global", allow_hyphen_values = true)]
    region: String,

    /// Image format: png or webp
    #[arg(short, long, default_value = "png")]
    format: String,

    /// Output image path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output directory (default: current directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Directory for downloaded data (default: $XDG_CACHE_HOME/ECMWF)
    #[arg(long, env = "JETSTREAM_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Provider request URL
    #[arg(long, env = "JETSTREAM_ENDPOINT")]
    endpoint: Option<String>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    request: RequestArgs,

    #[command(flatten)]
    plot: PlotArgs,

    /// Render every time step into --out-dir (not allowed with --output)
    #[arg(long)]
    all_times: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Data file (looked up in the cache directory if missing)
    file: PathBuf,

    /// Date of the time step to draw (default: first)
    #[arg(short, long)]
    date: Option<String>,

    /// Pressure level in hPa
    #[arg(short, long, default_value = "250")]
    level: String,

    /// Region preset or west,south,east,north (default: data extent)
    #[arg(short, long, allow_hyphen_values = true)]
    region: Option<String>,

    /// Image format: png or webp
    #[arg(short, long, default_value = "png")]
    format: String,

    /// Output image path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output directory (default: current directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Render every time step into --out-dir (not allowed with --output)
    #[arg(long)]
    all_times: bool,

    #[command(flatten)]
    plot: PlotArgs,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Data file (looked up in the cache directory if missing)
    file: PathBuf,
}

/// Plot settings; each overrides the config file when given.
#[derive(Args, Debug)]
struct PlotArgs {
    /// Map projection: cyl, merc or lcc
    #[arg(long)]
    projection: Option<String>,

    /// Colormap name
    #[arg(long)]
    colormap: Option<String>,

    /// Vector overlay: none, arrows or barbs
    #[arg(long)]
    overlay: Option<String>,

    /// Pixels between overlay vectors
    #[arg(long)]
    overlay_spacing: Option<u32>,

    /// Lower end of the color scale
    #[arg(long, allow_hyphen_values = true)]
    vmin: Option<f32>,

    /// Upper end of the color scale
    #[arg(long, allow_hyphen_values = true)]
    vmax: Option<f32>,

    /// Image resolution (the figure is 6.4 x 4.8 inches)
    #[arg(long)]
    dpi: Option<u32>,

    /// Degrees between graticule lines (0 disables)
    #[arg(long)]
    graticule_spacing: Option<f64>,

    /// TrueType font for the title and colorbar label
    #[arg(long, env = "JETSTREAM_FONT")]
    font: Option<PathBuf>,

    /// JSON file of gradient styles
    #[arg(long)]
    style_file: Option<PathBuf>,

    /// Style from the style file to use as colormap
    #[arg(long)]
    style: Option<String>,

    /// Multiplier applied to wind speed (default 3.0 at 250 hPa, else 7.5)
    #[arg(long)]
    speed_factor: Option<f32>,
}

impl PlotArgs {
    fn apply(&self, settings: &mut RenderSettings) {
        if let Some(v) = &self.projection {
            settings.projection = v.clone();
        }
        if let Some(v) = &self.colormap {
            settings.colormap = v.clone();
        }
        if let Some(v) = &self.overlay {
            settings.overlay = v.clone();
        }
        if let Some(v) = self.overlay_spacing {
            settings.overlay_spacing = v;
        }
        if let Some(v) = self.vmin {
            settings.vmin = v;
        }
        if let Some(v) = self.vmax {
            settings.vmax = v;
        }
        if let Some(v) = self.dpi {
            settings.dpi = v;
        }
        if let Some(v) = self.graticule_spacing {
            settings.graticule_spacing = v;
        }
        if let Some(v) = &self.font {
            settings.font = Some(v.clone());
        }
        if let Some(v) = &self.style_file {
            settings.style_file = Some(v.clone());
        }
        if let Some(v) = &self.style {
            settings.style = Some(v.clone());
        }
    }
}

fn init_tracing(level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level '{}'", level))?,
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))
}

fn main() -> ExitCode {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli.log_level, cli.log_format) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(kind = e.kind(), exit_code = e.exit_code(), "{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn execute(cli: Cli) -> JetResult<()> {
    let mut config = AppConfig::load_layered(cli.config.as_deref())?;

    match cli.command {
        Command::Inspect(args) => inspect(&args.file),
        Command::Render(args) => render(&mut config, args),
        Command::Fetch(args) => {
            let request = resolve(&mut config, &args)?;
            let fetcher = Fetcher::new(&config.provider)?;
            let outcome = runtime()?.block_on(fetcher.fetch(&request))?;
            println!("{}", outcome.path.display());
            Ok(())
        }
        Command::Run(args) => run(&mut config, args),
    }
}

/// Single-threaded runtime for the one network request.
fn runtime() -> JetResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

fn resolve(config: &mut AppConfig, args: &RequestArgs) -> JetResult<RequestDescriptor> {
    if let Some(endpoint) = &args.endpoint {
        config.provider.endpoint = Some(endpoint.clone());
    }
    let scratch_dir = args
        .scratch_dir
        .clone()
        .or_else(cache_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    let options = RequestOptions {
        date: args.date.clone(),
        until: args.until.clone(),
        level: args.level.clone(),
        region: args.region.clone(),
        format: args.format.clone(),
        output: args.output.clone(),
        out_dir: args.out_dir.clone(),
        scratch_dir,
    };
    let today = chrono::Utc::now().date_naive();
    Resolver::new(&config.provider, today).resolve(&options)
}

fn run(config: &mut AppConfig, args: RunArgs) -> JetResult<()> {
    let request = resolve(config, &args.request)?;
    let output = if args.all_times {
        Output::select(
            args.request.output.as_deref(),
            args.request.out_dir.as_deref(),
            true,
        )?
    } else {
        Output::File(request.output_path().to_path_buf())
    };
    args.plot.apply(&mut config.render);
    let mut render_config = config.render.to_render_config()?;
    render_config.format = request.format();

    let fetcher = Fetcher::new(&config.provider)?;
    let outcome = runtime()?.block_on(fetcher.fetch(&request))?;

    let job = RenderJob {
        data_path: outcome.path,
        level: request.level(),
        region: Some(request.region().bbox()),
        date: Some(request.date()),
        speed_factor: args.plot.speed_factor,
        output,
        config: render_config,
    };
    finish(&job, args.all_times)
}

fn render(config: &mut AppConfig, args: RenderArgs) -> JetResult<()> {
    let level =
        PressureLevel::parse(&args.level).map_err(|e| JetError::invalid("level", e.to_string()))?;
    let region = args
        .region
        .as_deref()
        .map(|r| {
            Region::parse(r)
                .map(|region| region.bbox())
                .map_err(|e| JetError::invalid("region", e.to_string()))
        })
        .transpose()?;
    let date = args
        .date
        .as_deref()
        .map(|d| parse_date(d).map_err(|e| JetError::invalid("date", e.to_string())))
        .transpose()?;
    let format = args
        .format
        .parse()
        .map_err(|e: renderer::RenderError| JetError::invalid("format", e.to_string()))?;

    args.plot.apply(&mut config.render);
    let mut render_config = config.render.to_render_config()?;
    render_config.format = format;

    let output = Output::select(
        args.output.as_deref(),
        args.out_dir.as_deref(),
        args.all_times,
    )?;
    let job = RenderJob {
        data_path: args.file,
        level,
        region,
        date,
        speed_factor: args.plot.speed_factor,
        output,
        config: render_config,
    };
    finish(&job, args.all_times)
}

fn finish(job: &RenderJob, all_times: bool) -> JetResult<()> {
    if all_times {
        for path in job.render_frames()? {
            println!("{}", path.display());
        }
    } else {
        let path = job.render()?;
        println!("{}", path.display());
    }
    Ok(())
}

fn inspect(file: &Path) -> JetResult<()> {
    let path = locate_data_file(file)?;
    let summaries = netcdf_parser::summarize(&path)?;
    info!(path = %path.display(), variables = summaries.len(), "Inspected data file");

    println!("In dataset {}:\n", path.display());
    for summary in summaries {
        println!("{}", summary);
    }
    Ok(())
}
