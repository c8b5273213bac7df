//! Reanalysis wind datasets: u/v components on pressure levels.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use jet_common::{CfTimeUnits, PressureLevel, WindGrid};
use tracing::{debug, info, warn};

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{dimension_names, find_variable, get_f64_attr, get_str_attr, open_checked};

const LON_NAMES: &[&str] = &["longitude", "lon"];
const LAT_NAMES: &[&str] = &["latitude", "lat"];
const LEVEL_NAMES: &[&str] = &["level", "plev", "isobaricInhPa", "pressure_level"];
const TIME_NAMES: &[&str] = &["time", "valid_time"];
const U_NAMES: &[&str] = &["u", "u_component_of_wind"];
const V_NAMES: &[&str] = &["v", "v_component_of_wind"];

const CALENDARS: &[&str] = &["gregorian", "standard", "proleptic_gregorian"];

/// Decoded contents of a wind data file.
///
/// Holds every time step and level in memory; `u`/`v` are laid out as
/// `[time][level][latitude][longitude]`.
#[derive(Debug)]
pub struct WindDataset {
    path: PathBuf,
    lats: Vec<f64>,
    lons: Vec<f64>,
    /// Empty for single-level files without a level axis.
    levels: Vec<f64>,
    times: Vec<NaiveDateTime>,
    u: Vec<f32>,
    v: Vec<f32>,
}

impl WindDataset {
    /// Open and decode a data file.
    pub fn open<P: AsRef<Path>>(path: P) -> NetCdfResult<Self> {
        let path = path.as_ref();
        let (file, format) = open_checked(path)?;
        debug!(path = %path.display(), format = ?format, "Opened data file");

        let lons = read_axis(&file, LON_NAMES, "longitude")?;
        let lats = read_axis(&file, LAT_NAMES, "latitude")?;
        let levels = match find_variable(&file, LEVEL_NAMES) {
            Some(var) => var.get_values::<f64, _>(..)?,
            None => Vec::new(),
        };
        let times = read_times(&file)?;

        let u_var = find_variable(&file, U_NAMES)
            .ok_or_else(|| NetCdfError::MissingData("u wind component variable".to_string()))?;
        let v_var = find_variable(&file, V_NAMES)
            .ok_or_else(|| NetCdfError::MissingData("v wind component variable".to_string()))?;

        let mut expected_dims = vec![TIME_NAMES, LEVEL_NAMES, LAT_NAMES, LON_NAMES];
        if levels.is_empty() {
            expected_dims.remove(1);
        }
        check_layout(&u_var, &expected_dims)?;
        check_layout(&v_var, &expected_dims)?;

        let u = read_packed(&u_var)?;
        let v = read_packed(&v_var)?;

        let expected = times.len() * levels.len().max(1) * lats.len() * lons.len();
        if u.len() != expected || v.len() != expected {
            return Err(NetCdfError::InvalidFormat(format!(
                "wind components hold {}/{} values, axes declare {}",
                u.len(),
                v.len(),
                expected
            )));
        }

        info!(
            path = %path.display(),
            times = times.len(),
            levels = levels.len(),
            nlat = lats.len(),
            nlon = lons.len(),
            "Decoded wind dataset"
        );

        Ok(Self {
            path: path.to_path_buf(),
            lats,
            lons,
            levels,
            times,
            u,
            v,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Index of `level` on the level axis.
    pub fn level_index(&self, level: PressureLevel) -> NetCdfResult<usize> {
        if self.levels.is_empty() {
            debug!(level = level.hpa(), "Single-level file, using its only level");
            return Ok(0);
        }
        self.levels
            .iter()
            .position(|l| (*l - level.hpa() as f64).abs() < 1e-6)
            .ok_or(NetCdfError::LevelNotFound(level.hpa()))
    }

    /// Index of the first time step falling on `date`.
    pub fn time_index_on(&self, date: NaiveDate) -> NetCdfResult<usize> {
        self.times
            .iter()
            .position(|t| t.date() == date)
            .ok_or_else(|| NetCdfError::TimeNotFound(date.format("%Y-%m-%d").to_string()))
    }

    /// Extract the horizontal wind slice for one time step and level.
    pub fn grid(&self, time_index: usize, level: PressureLevel) -> NetCdfResult<WindGrid> {
        if time_index >= self.times.len() {
            return Err(NetCdfError::TimeNotFound(format!("index {}", time_index)));
        }
        let level_index = self.level_index(level)?;
        let plane = self.lats.len() * self.lons.len();
        let offset = (time_index * self.levels.len().max(1) + level_index) * plane;

        WindGrid::new(
            self.lats.clone(),
            self.lons.clone(),
            self.u[offset..offset + plane].to_vec(),
            self.v[offset..offset + plane].to_vec(),
        )
        .map_err(|e| NetCdfError::InvalidFormat(e.to_string()))
    }
}

fn read_axis(file: &netcdf::File, names: &[&str], what: &str) -> NetCdfResult<Vec<f64>> {
    let var = find_variable(file, names)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} coordinate variable", what)))?;
    let values: Vec<f64> = var.get_values(..)?;
    if values.is_empty() {
        return Err(NetCdfError::InvalidFormat(format!("{} axis is empty", what)));
    }
    Ok(values)
}

fn read_times(file: &netcdf::File) -> NetCdfResult<Vec<NaiveDateTime>> {
    let var = find_variable(file, TIME_NAMES)
        .ok_or_else(|| NetCdfError::MissingData("time coordinate variable".to_string()))?;
    let units = get_str_attr(&var, "units")
        .ok_or_else(|| NetCdfError::MissingData("time units attribute".to_string()))?;
    let units =
        CfTimeUnits::parse(&units).map_err(|e| NetCdfError::InvalidFormat(e.to_string()))?;

    if let Some(calendar) = get_str_attr(&var, "calendar") {
        if !CALENDARS.contains(&calendar.to_ascii_lowercase().as_str()) {
            return Err(NetCdfError::InvalidFormat(format!(
                "unsupported calendar '{}'",
                calendar
            )));
        }
    }

    let raw: Vec<f64> = var.get_values(..)?;
    if raw.is_empty() {
        return Err(NetCdfError::MissingData("time steps".to_string()));
    }
    raw.iter()
        .map(|&t| {
            units
                .to_datetime(t)
                .ok_or_else(|| NetCdfError::InvalidFormat(format!("time value {} out of range", t)))
        })
        .collect()
}

/// Check that a variable's dimensions appear in the expected order.
fn check_layout(var: &netcdf::Variable, expected: &[&[&str]]) -> NetCdfResult<()> {
    let dims = dimension_names(var);
    let matches = dims.len() == expected.len()
        && dims
            .iter()
            .zip(expected)
            .all(|(dim, names)| names.contains(&dim.as_str()));
    if !matches {
        return Err(NetCdfError::InvalidFormat(format!(
            "variable '{}' has dimensions {:?}, expected time, [level,] latitude, longitude",
            var.name(),
            dims
        )));
    }
    Ok(())
}

/// Read a (possibly packed) variable, applying scale/offset and masking fills.
fn read_packed(var: &netcdf::Variable) -> NetCdfResult<Vec<f32>> {
    let raw: Vec<f64> = var.get_values(..)?;

    let scale_factor = get_f64_attr(var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f64_attr(var, "add_offset").unwrap_or(0.0);
    let fill_value = get_f64_attr(var, "_FillValue");
    let missing_value = get_f64_attr(var, "missing_value");

    let mut masked = 0usize;
    let data: Vec<f32> = raw
        .iter()
        .map(|&val| {
            if Some(val) == fill_value || Some(val) == missing_value || val.is_nan() {
                masked += 1;
                f32::NAN
            } else {
                (val * scale_factor + add_offset) as f32
            }
        })
        .collect();

    if masked == data.len() && !data.is_empty() {
        warn!(variable = %var.name(), "Every value is a fill value");
    }
    debug!(
        variable = %var.name(),
        scale_factor,
        add_offset,
        masked,
        "Unpacked variable"
    );

    Ok(data)
}
