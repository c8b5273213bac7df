//! Test data generators for creating synthetic wind fields.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use jet_common::WindGrid;

/// Latitude/longitude axes laid out like the reanalysis archive:
/// latitudes from 90 down to -90, longitudes from 0 up to `360 - step`.
///
/// # Example
///
/// ```
/// use test_utils::era_axes;
///
/// let (lats, lons) = era_axes(7.5);
/// assert_eq!(lats.len(), 25);
/// assert_eq!(lons.len(), 48);
/// assert_eq!(lats[0], 90.0);
/// ```
pub fn era_axes(step: f64) -> (Vec<f64>, Vec<f64>) {
    let nlat = (180.0 / step).round() as usize + 1;
    let nlon = (360.0 / step).round() as usize;
    let lats = (0..nlat).map(|j| 90.0 - j as f64 * step).collect();
    let lons = (0..nlon).map(|i| i as f64 * step).collect();
    (lats, lons)
}

/// Westerly jet at one point: two meandering bands near 40N and 40S.
///
/// Returns (u, v) in m/s; peak zonal speed is about 60 m/s.
pub fn jet_wind_at(lon: f64, lat: f64) -> (f32, f32) {
    let meander = 8.0 * (3.0 * lon.to_radians()).sin();
    let band = |center: f64| (-((lat - center - meander) / 10.0).powi(2)).exp();
    let strength = band(40.0) + band(-40.0);
    let u = 60.0 * strength + 5.0;
    let v = 12.0 * (3.0 * lon.to_radians()).cos() * strength;
    (u as f32, v as f32)
}

/// Creates (u, v) component grids of the synthetic jet, row-major over
/// `lats` x `lons`.
pub fn create_jet_components(lats: &[f64], lons: &[f64]) -> (Vec<f32>, Vec<f32>) {
    let mut u = Vec::with_capacity(lats.len() * lons.len());
    let mut v = Vec::with_capacity(lats.len() * lons.len());
    for &lat in lats {
        for &lon in lons {
            let (uu, vv) = jet_wind_at(lon, lat);
            u.push(uu);
            v.push(vv);
        }
    }
    (u, v)
}

/// A global synthetic jet grid at the given resolution.
pub fn synthetic_wind_grid(step: f64) -> WindGrid {
    let (lats, lons) = era_axes(step);
    let (u, v) = create_jet_components(&lats, &lons);
    WindGrid::new(lats, lons, u, v).expect("synthetic axes are valid")
}

/// A regional grid with the same (u, v) in every cell.
pub fn uniform_wind_grid(bbox: (f64, f64, f64, f64), step: f64, u: f32, v: f32) -> WindGrid {
    let (min_lon, min_lat, max_lon, max_lat) = bbox;
    let nlon = ((max_lon - min_lon) / step).round() as usize + 1;
    let nlat = ((max_lat - min_lat) / step).round() as usize + 1;
    let lons: Vec<f64> = (0..nlon).map(|i| min_lon + i as f64 * step).collect();
    let lats: Vec<f64> = (0..nlat).map(|j| max_lat - j as f64 * step).collect();
    let n = nlon * nlat;
    WindGrid::new(lats, lons, vec![u; n], vec![v; n]).expect("uniform axes are valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_era_axes() {
        let (lats, lons) = era_axes(0.75);
        assert_eq!(lats.len(), 241);
        assert_eq!(lons.len(), 480);
        assert_eq!(*lats.last().unwrap(), -90.0);
        assert!((lons[479] - 359.25).abs() < 1e-9);
    }

    #[test]
    fn test_jet_peaks_near_40n() {
        let (u_jet, _) = jet_wind_at(0.0, 40.0);
        let (u_equator, _) = jet_wind_at(0.0, 0.0);
        assert!(u_jet > 60.0);
        assert!(u_equator < 10.0);
    }

    #[test]
    fn test_synthetic_grid_shape() {
        let grid = synthetic_wind_grid(7.5);
        assert_eq!(grid.width(), 48);
        assert_eq!(grid.height(), 25);
        assert!(grid.is_global());
    }

    #[test]
    fn test_uniform_grid() {
        let grid = uniform_wind_grid((-20.0, 30.0, 20.0, 60.0), 10.0, 10.0, 0.0);
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 4);
        assert!(grid.u().iter().all(|&u| u == 10.0));
    }
}
