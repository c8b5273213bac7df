//! Synthetic reanalysis sample files.
//!
//! The files mirror what the archive returns for a pressure-level wind
//! request: `longitude`, `latitude`, `level` and `time` axes, with `u` and
//! `v` shaped `[time][level][latitude][longitude]`, optionally packed as
//! 16-bit integers with `scale_factor`/`add_offset`.

use std::path::Path;

use crate::generators::{create_jet_components, era_axes};

/// Hours since 1900-01-01 of 2018-04-29 18:00, the reference analysis.
pub const REFERENCE_HOURS: i32 = 1_037_226;

/// CF units used by the archive for its time axis.
pub const ERA_TIME_UNITS: &str = "hours since 1900-01-01 00:00:00.0";

/// Packed fill value.
pub const PACKED_FILL: i16 = -32767;

/// Description of a sample file to write.
#[derive(Debug, Clone)]
pub struct SampleSpec {
    /// Grid spacing in degrees.
    pub step: f64,
    /// Pressure levels in hPa; empty writes a file without a level axis.
    pub levels: Vec<i32>,
    /// Time axis values, in hours since 1900-01-01; empty writes a file with
    /// no time records.
    pub hours: Vec<i32>,
    /// Store u/v as scaled 16-bit integers.
    pub packed: bool,
    /// Number of leading cells of every slice replaced by fill values.
    pub fill_cells: usize,
}

impl SampleSpec {
    /// Coarse global file with the jet level and 500 hPa, two daily analyses
    /// starting 2018-04-29 18:00.
    pub fn era_interim_coarse() -> Self {
        Self {
            step: 7.5,
            levels: vec![250, 500],
            hours: vec![REFERENCE_HOURS, REFERENCE_HOURS + 24],
            packed: false,
            fill_cells: 0,
        }
    }

    pub fn packed(mut self) -> Self {
        self.packed = true;
        self
    }

    pub fn single_level(mut self) -> Self {
        self.levels.clear();
        self
    }

    pub fn with_fill_cells(mut self, n: usize) -> Self {
        self.fill_cells = n;
        self
    }

    pub fn without_times(mut self) -> Self {
        self.hours.clear();
        self
    }
}

/// Write a sample file described by `spec`.
///
/// The wind field is the synthetic jet scaled by `1 + 0.1 * level_index`
/// and shifted by `2 m/s` per time step, so slices are distinguishable.
pub fn write_sample_netcdf(path: &Path, spec: &SampleSpec) -> Result<(), netcdf::Error> {
    let (lats, lons) = era_axes(spec.step);
    let (base_u, base_v) = create_jet_components(&lats, &lons);
    let nlevels = spec.levels.len().max(1);

    let mut file = netcdf::create(path)?;
    file.add_dimension("longitude", lons.len())?;
    file.add_dimension("latitude", lats.len())?;
    if !spec.levels.is_empty() {
        file.add_dimension("level", spec.levels.len())?;
    }
    file.add_dimension("time", spec.hours.len())?;

    {
        let mut var = file.add_variable::<f32>("longitude", &["longitude"])?;
        var.put_attribute("units", "degrees_east")?;
        var.put_attribute("long_name", "longitude")?;
        let values: Vec<f32> = lons.iter().map(|&x| x as f32).collect();
        var.put_values(&values, ..)?;
    }
    {
        let mut var = file.add_variable::<f32>("latitude", &["latitude"])?;
        var.put_attribute("units", "degrees_north")?;
        var.put_attribute("long_name", "latitude")?;
        let values: Vec<f32> = lats.iter().map(|&y| y as f32).collect();
        var.put_values(&values, ..)?;
    }
    if !spec.levels.is_empty() {
        let mut var = file.add_variable::<i32>("level", &["level"])?;
        var.put_attribute("units", "millibars")?;
        var.put_attribute("long_name", "pressure_level")?;
        var.put_values(&spec.levels, ..)?;
    }
    {
        let mut var = file.add_variable::<i32>("time", &["time"])?;
        var.put_attribute("units", ERA_TIME_UNITS)?;
        var.put_attribute("long_name", "time")?;
        var.put_attribute("calendar", "gregorian")?;
        if !spec.hours.is_empty() {
            var.put_values(&spec.hours, ..)?;
        }
    }

    let dims: Vec<&str> = if spec.levels.is_empty() {
        vec!["time", "latitude", "longitude"]
    } else {
        vec!["time", "level", "latitude", "longitude"]
    };

    for (name, base, long_name) in [
        ("u", &base_u, "U component of wind"),
        ("v", &base_v, "V component of wind"),
    ] {
        let mut values = Vec::with_capacity(spec.hours.len() * nlevels * base.len());
        for t in 0..spec.hours.len() {
            for l in 0..nlevels {
                let scale = 1.0 + 0.1 * l as f32;
                let shift = 2.0 * t as f32;
                values.extend(base.iter().enumerate().map(|(i, &x)| {
                    if i < spec.fill_cells {
                        f32::NAN
                    } else {
                        x * scale + shift
                    }
                }));
            }
        }
        write_component(&mut file, name, long_name, &dims, &values, spec.packed)?;
    }

    Ok(())
}

fn write_component(
    file: &mut netcdf::FileMut,
    name: &str,
    long_name: &str,
    dims: &[&str],
    values: &[f32],
    packed: bool,
) -> Result<(), netcdf::Error> {
    if packed {
        let (min, max) = values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let add_offset = (max as f64 + min as f64) / 2.0;
        let scale_factor = ((max as f64 - min as f64) / 65000.0).max(1e-6);
        let packed_values: Vec<i16> = values
            .iter()
            .map(|&v| {
                if v.is_nan() {
                    PACKED_FILL
                } else {
                    ((v as f64 - add_offset) / scale_factor).round() as i16
                }
            })
            .collect();

        let mut var = file.add_variable::<i16>(name, dims)?;
        var.put_attribute("scale_factor", scale_factor)?;
        var.put_attribute("add_offset", add_offset)?;
        var.put_attribute("_FillValue", PACKED_FILL)?;
        var.put_attribute("missing_value", PACKED_FILL)?;
        var.put_attribute("units", "m s**-1")?;
        var.put_attribute("long_name", long_name)?;
        if !packed_values.is_empty() {
            var.put_values(&packed_values, ..)?;
        }
    } else {
        let mut var = file.add_variable::<f32>(name, dims)?;
        var.put_attribute("_FillValue", -9999.0f32)?;
        var.put_attribute("units", "m s**-1")?;
        var.put_attribute("long_name", long_name)?;
        let filled: Vec<f32> = values
            .iter()
            .map(|&v| if v.is_nan() { -9999.0 } else { v })
            .collect();
        if !filled.is_empty() {
            var.put_values(&filled, ..)?;
        }
    }
    Ok(())
}
