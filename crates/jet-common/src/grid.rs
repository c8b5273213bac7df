//! Regular latitude/longitude wind grids.

use crate::BoundingBox;

/// One horizontal slice of (u, v) wind components on a regular lat/lon mesh.
///
/// Values are row-major: `index = row * lons.len() + col`, where rows follow
/// `lats` and columns follow `lons` in file order. Latitudes may be
/// ascending or descending; longitudes must be monotonically increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct WindGrid {
    lats: Vec<f64>,
    lons: Vec<f64>,
    u: Vec<f32>,
    v: Vec<f32>,
}

impl WindGrid {
    /// Build a grid, checking that the component arrays match the axes.
    pub fn new(lats: Vec<f64>, lons: Vec<f64>, u: Vec<f32>, v: Vec<f32>) -> Result<Self, GridError> {
        if lats.len() < 2 || lons.len() < 2 {
            return Err(GridError::TooSmall {
                nlat: lats.len(),
                nlon: lons.len(),
            });
        }
        let expected = lats.len() * lons.len();
        if u.len() != expected || v.len() != expected {
            return Err(GridError::ShapeMismatch {
                expected,
                u: u.len(),
                v: v.len(),
            });
        }
        if lons.windows(2).any(|w| w[1] <= w[0]) {
            return Err(GridError::NonMonotonic("longitude"));
        }
        let ascending = lats[1] > lats[0];
        if lats
            .windows(2)
            .any(|w| (w[1] > w[0]) != ascending || w[1] == w[0])
        {
            return Err(GridError::NonMonotonic("latitude"));
        }

        Ok(Self { lats, lons, u, v })
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn u(&self) -> &[f32] {
        &self.u
    }

    pub fn v(&self) -> &[f32] {
        &self.v
    }

    /// Number of longitude columns.
    pub fn width(&self) -> usize {
        self.lons.len()
    }

    /// Number of latitude rows.
    pub fn height(&self) -> usize {
        self.lats.len()
    }

    /// Geographic extent covered by the grid points.
    pub fn extent(&self) -> BoundingBox {
        let (lat_a, lat_b) = (self.lats[0], self.lats[self.lats.len() - 1]);
        BoundingBox::new(
            self.lons[0],
            lat_a.min(lat_b),
            self.lons[self.lons.len() - 1],
            lat_a.max(lat_b),
        )
    }

    /// Longitude spacing, assuming a regular mesh.
    pub fn lon_step(&self) -> f64 {
        (self.lons[self.lons.len() - 1] - self.lons[0]) / (self.lons.len() - 1) as f64
    }

    /// Whether the columns wrap around the whole globe.
    pub fn is_global(&self) -> bool {
        let span = self.lons[self.lons.len() - 1] - self.lons[0] + self.lon_step();
        (span - 360.0).abs() < self.lon_step() * 0.5
    }

    /// Scaled wind speed `factor * sqrt(u^2 + v^2)` for every cell.
    ///
    /// Fill cells (NaN in either component) stay NaN.
    pub fn speeds(&self, factor: f32) -> Vec<f32> {
        self.u
            .iter()
            .zip(&self.v)
            .map(|(u, v)| factor * (u * u + v * v).sqrt())
            .collect()
    }

    /// Bilinearly interpolate (u, v) at a geographic point.
    ///
    /// Returns `None` outside the grid or where a neighbour is a fill value.
    pub fn sample(&self, lon: f64, lat: f64) -> Option<(f32, f32)> {
        let (i0, i1, tx, j0, j1, ty) = self.locate(lon, lat)?;
        let w = self.width();
        let interp = |data: &[f32]| -> Option<f32> {
            let v00 = data[j0 * w + i0];
            let v10 = data[j0 * w + i1];
            let v01 = data[j1 * w + i0];
            let v11 = data[j1 * w + i1];
            if v00.is_nan() || v10.is_nan() || v01.is_nan() || v11.is_nan() {
                return None;
            }
            let top = v00 as f64 * (1.0 - tx) + v10 as f64 * tx;
            let bottom = v01 as f64 * (1.0 - tx) + v11 as f64 * tx;
            Some((top * (1.0 - ty) + bottom * ty) as f32)
        };
        Some((interp(&self.u)?, interp(&self.v)?))
    }

    /// Bilinearly interpolate an arbitrary field laid out like this grid.
    pub fn sample_field(&self, field: &[f32], lon: f64, lat: f64) -> Option<f32> {
        if field.len() != self.u.len() {
            return None;
        }
        let (i0, i1, tx, j0, j1, ty) = self.locate(lon, lat)?;
        let w = self.width();
        let v00 = field[j0 * w + i0];
        let v10 = field[j0 * w + i1];
        let v01 = field[j1 * w + i0];
        let v11 = field[j1 * w + i1];
        if v00.is_nan() || v10.is_nan() || v01.is_nan() || v11.is_nan() {
            return None;
        }
        let top = v00 as f64 * (1.0 - tx) + v10 as f64 * tx;
        let bottom = v01 as f64 * (1.0 - tx) + v11 as f64 * tx;
        Some((top * (1.0 - ty) + bottom * ty) as f32)
    }

    /// Find the surrounding cell indices and fractional offsets for a point.
    fn locate(&self, lon: f64, lat: f64) -> Option<(usize, usize, f64, usize, usize, f64)> {
        let (j0, j1, ty) = locate_lat(&self.lats, lat)?;
        let (i0, i1, tx) = self.locate_lon(lon)?;
        Some((i0, i1, tx, j0, j1, ty))
    }

    fn locate_lon(&self, lon: f64) -> Option<(usize, usize, f64)> {
        let first = self.lons[0];
        let step = self.lon_step();
        let n = self.lons.len();

        // Bring the longitude into the grid's convention.
        let mut x = lon;
        while x < first {
            x += 360.0;
        }
        while x >= first + 360.0 {
            x -= 360.0;
        }

        let pos = (x - first) / step;
        let i0 = pos.floor() as usize;
        let t = pos - i0 as f64;
        if i0 + 1 < n {
            Some((i0, i0 + 1, t))
        } else if i0 + 1 == n && t < 1e-9 {
            Some((i0, i0, 0.0))
        } else if self.is_global() && i0 + 1 == n {
            // Between the last column and the wrapped first column.
            Some((n - 1, 0, t))
        } else {
            None
        }
    }
}

fn locate_lat(lats: &[f64], lat: f64) -> Option<(usize, usize, f64)> {
    let n = lats.len();
    let first = lats[0];
    let step = (lats[n - 1] - first) / (n - 1) as f64;
    let pos = (lat - first) / step;
    if pos < -1e-9 || pos > (n - 1) as f64 + 1e-9 {
        return None;
    }
    let pos = pos.clamp(0.0, (n - 1) as f64);
    let j0 = (pos.floor() as usize).min(n - 2);
    Some((j0, j0 + 1, pos - j0 as f64))
}

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("Grid must have at least 2x2 points, got {nlat} latitudes x {nlon} longitudes")]
    TooSmall { nlat: usize, nlon: usize },

    #[error("Grid shape mismatch: expected {expected} values, got u={u} v={v}")]
    ShapeMismatch { expected: usize, u: usize, v: usize },

    #[error("{0} axis is not strictly monotonic")]
    NonMonotonic(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> WindGrid {
        // 3 lats (north to south) x 4 lons
        let lats = vec![10.0, 0.0, -10.0];
        let lons = vec![0.0, 10.0, 20.0, 30.0];
        let u: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let v = vec![0.0; 12];
        WindGrid::new(lats, lons, u, v).unwrap()
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = WindGrid::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0; 3], vec![0.0; 4]);
        assert!(matches!(err, Err(GridError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_sample_on_grid_points() {
        let grid = small_grid();
        assert_eq!(grid.sample(0.0, 10.0), Some((0.0, 0.0)));
        assert_eq!(grid.sample(10.0, 0.0), Some((5.0, 0.0)));
        assert_eq!(grid.sample(30.0, -10.0), Some((11.0, 0.0)));
    }

    #[test]
    fn test_sample_interpolates() {
        let grid = small_grid();
        let (u, _) = grid.sample(5.0, 10.0).unwrap();
        assert!((u - 0.5).abs() < 1e-6);
        let (u, _) = grid.sample(0.0, 5.0).unwrap();
        assert!((u - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_sample_outside_regional_grid() {
        let grid = small_grid();
        assert!(grid.sample(45.0, 0.0).is_none());
        assert!(grid.sample(10.0, 20.0).is_none());
    }

    #[test]
    fn test_negative_longitude_wraps_into_0_360_grid() {
        let lats = vec![0.0, 1.0];
        let lons: Vec<f64> = (0..4).map(|i| i as f64 * 90.0).collect();
        let u: Vec<f32> = vec![0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0];
        let grid = WindGrid::new(lats, lons, u, vec![0.0; 8]).unwrap();
        assert!(grid.is_global());
        // -90 is 270 in the grid's convention
        assert_eq!(grid.sample(-90.0, 0.0).map(|s| s.0), Some(3.0));
        // -45 sits between column 3 (270) and the wrapped column 0 (360)
        let (u, _) = grid.sample(-45.0, 0.0).unwrap();
        assert!((u - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_speeds_scaled() {
        let grid = WindGrid::new(
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![3.0, 0.0, f32::NAN, 1.0],
            vec![4.0, 0.0, 0.0, 0.0],
        )
        .unwrap();
        let speeds = grid.speeds(2.0);
        assert_eq!(speeds[0], 10.0);
        assert_eq!(speeds[1], 0.0);
        assert!(speeds[2].is_nan());
    }
}
