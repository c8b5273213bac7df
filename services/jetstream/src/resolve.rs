//! Parameter resolution: user options to a concrete provider request.
//!
//! Resolution is pure: it validates the options against the provider's
//! availability window and the supported levels, regions and formats, and
//! derives the request query, scratch path and output path without touching
//! the filesystem or the network.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use jet_common::time::parse_date;
use jet_common::{DateSpan, JetError, JetResult, PressureLevel, Region};
use renderer::ImageFormat;

use crate::config::ProviderConfig;

/// Parameter codes for the u and v wind components.
pub const WIND_PARAMS: &str = "131.128/132.128";

/// User-facing request options, as given on the command line.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub date: String,
    pub until: Option<String>,
    pub level: String,
    pub region: String,
    pub format: String,
    /// Explicit output file; overrides `out_dir`.
    pub output: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub scratch_dir: PathBuf,
}

impl RequestOptions {
    /// Options for one date with default level, region and format.
    pub fn for_date(date: &str, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            date: date.to_string(),
            until: None,
            level: "250".to_string(),
            region: "global".to_string(),
            format: "png".to_string(),
            output: None,
            out_dir: None,
            scratch_dir: scratch_dir.into(),
        }
    }
}

/// A fully resolved request. Built once per invocation, read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    dates: DateSpan,
    level: PressureLevel,
    region: Region,
    format: ImageFormat,
    output_path: PathBuf,
    scratch_path: PathBuf,
    endpoint: String,
    query: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// First requested date; the date that is rendered.
    pub fn date(&self) -> NaiveDate {
        self.dates.start
    }

    pub fn dates(&self) -> DateSpan {
        self.dates
    }

    pub fn level(&self) -> PressureLevel {
        self.level
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn scratch_path(&self) -> &Path {
        &self.scratch_path
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Provider query parameters, in a stable order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Look up a single query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Output file name for a map of `level` on `date`.
///
/// The jet stream level gets `jetstream-DATE`, others `winds-<level>hPa-DATE`.
pub fn output_file_name(level: PressureLevel, date: NaiveDate, format: ImageFormat) -> String {
    let date = date.format("%Y-%m-%d");
    if level.is_jetstream() {
        format!("jetstream-{}.{}", date, format.extension())
    } else {
        format!("winds-{}hPa-{}.{}", level.hpa(), date, format.extension())
    }
}

/// Scratch data file name for a request.
pub fn scratch_file_name(dates: DateSpan, level: PressureLevel, region: &Region) -> String {
    let region = region.name().replace(',', "_");
    format!(
        "windspeed-{}-to-{}-{}-{}.nc",
        dates.start.format("%Y-%m-%d"),
        dates.end.format("%Y-%m-%d"),
        level.hpa(),
        region
    )
}

/// Resolves request options against a provider configuration.
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    provider: &'a ProviderConfig,
    today: NaiveDate,
}

impl<'a> Resolver<'a> {
    pub fn new(provider: &'a ProviderConfig, today: NaiveDate) -> Self {
        Self { provider, today }
    }

    pub fn resolve(&self, opts: &RequestOptions) -> JetResult<RequestDescriptor> {
        let window = self.provider.window();

        let start = parse_date(&opts.date).map_err(|e| JetError::invalid("date", e.to_string()))?;
        window
            .check(start, self.today)
            .map_err(|e| JetError::invalid("date", e.to_string()))?;

        let dates = match &opts.until {
            Some(until) => {
                let end =
                    parse_date(until).map_err(|e| JetError::invalid("until", e.to_string()))?;
                window
                    .check(end, self.today)
                    .map_err(|e| JetError::invalid("until", e.to_string()))?;
                DateSpan::new(start, end).map_err(|e| JetError::invalid("until", e.to_string()))?
            }
            None => DateSpan::single(start),
        };

        let level =
            PressureLevel::parse(&opts.level).map_err(|e| JetError::invalid("level", e.to_string()))?;
        let region =
            Region::parse(&opts.region).map_err(|e| JetError::invalid("region", e.to_string()))?;
        let format: ImageFormat = opts
            .format
            .parse()
            .map_err(|e: renderer::RenderError| JetError::invalid("format", e.to_string()))?;

        let output_path = match &opts.output {
            Some(path) => path.clone(),
            None => opts
                .out_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(output_file_name(level, start, format)),
        };
        let scratch_path = opts
            .scratch_dir
            .join(scratch_file_name(dates, level, &region));

        let descriptor = RequestDescriptor {
            dates,
            level,
            region,
            format,
            output_path,
            scratch_path,
            endpoint: self.provider.endpoint_url(),
            query: self.query(dates, level, &region),
        };
        tracing::debug!(
            dates = %dates.to_mars(),
            level = %level,
            region = %region.name(),
            output = %descriptor.output_path.display(),
            "Resolved request"
        );
        Ok(descriptor)
    }

    fn query(&self, dates: DateSpan, level: PressureLevel, region: &Region) -> Vec<(String, String)> {
        let p = self.provider;
        [
            ("class", p.class.clone()),
            ("dataset", p.dataset.clone()),
            ("date", dates.to_mars()),
            ("expver", "1".to_string()),
            ("grid", p.grid.clone()),
            ("levelist", level.hpa().to_string()),
            ("levtype", "pl".to_string()),
            ("param", WIND_PARAMS.to_string()),
            ("step", "0".to_string()),
            ("stream", p.stream.clone()),
            ("time", p.times.join("/")),
            ("area", region.bbox().to_mars_area()),
            ("type", "an".to_string()),
            ("format", "netcdf".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}
