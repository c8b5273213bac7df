//! Rendering stage: data file to map image(s).

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use jet_common::{BoundingBox, JetError, JetResult, PressureLevel, WindGrid};
use netcdf_parser::WindDataset;
use renderer::{MapRenderer, RenderConfig};
use tracing::{debug, info};

use crate::resolve::output_file_name;

/// Where rendered images go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Exactly this file.
    File(PathBuf),
    /// A directory; file names are derived from level and date.
    Directory(PathBuf),
}

impl Output {
    /// Choose the destination from the command-line flags.
    ///
    /// `--all-times` writes several files, so it takes a directory and
    /// refuses an explicit `--output` file.
    pub fn select(
        output: Option<&Path>,
        out_dir: Option<&Path>,
        all_times: bool,
    ) -> JetResult<Self> {
        let dir = || out_dir.map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        match (output, all_times) {
            (Some(path), true) => Err(JetError::invalid(
                "output",
                format!(
                    "--all-times writes one file per time step; use --out-dir instead of --output {}",
                    path.display()
                ),
            )),
            (Some(path), false) => Ok(Output::File(path.to_path_buf())),
            (None, _) => Ok(Output::Directory(dir())),
        }
    }
}

/// One rendering invocation.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub data_path: PathBuf,
    pub level: PressureLevel,
    /// Area to draw; the full data extent when unset.
    pub region: Option<BoundingBox>,
    /// Date to draw; the first time step when unset.
    pub date: Option<NaiveDate>,
    /// Overrides the level's default speed factor.
    pub speed_factor: Option<f32>,
    pub output: Output,
    pub config: RenderConfig,
}

/// Map title for a level and date.
pub fn title_for(level: PressureLevel, date: NaiveDate) -> String {
    let date = date.format("%Y-%m-%d");
    if level.is_jetstream() {
        format!("Jet Stream {}", date)
    } else {
        format!("Winds {} mb {}", level.hpa(), date)
    }
}

/// Colorbar caption for a level.
pub fn colorbar_label(level: PressureLevel) -> String {
    format!("Wind speed at {} mb (scaled km/h)", level.hpa())
}

/// Provider cache directory: `$XDG_CACHE_HOME/ECMWF`, else `~/.cache/ECMWF`.
pub fn cache_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .map(|base| base.join("ECMWF"))
}

/// Resolve a data file path, falling back to the cache directory.
pub fn locate_data_file(path: &Path) -> JetResult<PathBuf> {
    locate_in(path, cache_dir().as_deref())
}

fn locate_in(path: &Path, cache: Option<&Path>) -> JetResult<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let (Some(cache), Some(name)) = (cache, path.file_name()) {
        let cached = cache.join(name);
        if cached.exists() {
            debug!(path = %cached.display(), "Found data file in cache directory");
            return Ok(cached);
        }
    }
    Err(JetError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("data file {} does not exist", path.display()),
    )))
}

impl RenderJob {
    fn speed_factor(&self) -> f32 {
        self.speed_factor
            .unwrap_or_else(|| self.level.default_speed_factor())
    }

    fn open(&self) -> JetResult<WindDataset> {
        let path = locate_data_file(&self.data_path)?;
        let dataset = WindDataset::open(&path)?;
        info!(
            path = %path.display(),
            times = dataset.times().len(),
            levels = dataset.levels().len(),
            "Opened data file"
        );
        Ok(dataset)
    }

    /// Draw one time step into memory.
    fn draw(&self, dataset: &WindDataset, time_index: usize) -> JetResult<(NaiveDate, Vec<u8>)> {
        let date = dataset
            .times()
            .get(time_index)
            .ok_or_else(|| JetError::Parse(format!("no time step {} in data file", time_index)))?
            .date();
        let grid: WindGrid = dataset.grid(time_index, self.level)?;
        let speeds = grid.speeds(self.speed_factor());
        let region = self.region.unwrap_or_else(|| grid.extent());

        let config = RenderConfig {
            title: Some(title_for(self.level, date)),
            colorbar_label: Some(colorbar_label(self.level)),
            ..self.config.clone()
        };
        let renderer = MapRenderer::new(config)?;
        let image = renderer.render(&grid, &speeds, &region)?;
        Ok((date, image.bytes))
    }

    fn output_for(&self, date: NaiveDate) -> JetResult<PathBuf> {
        match &self.output {
            Output::File(path) => Ok(path.clone()),
            Output::Directory(dir) => {
                ensure_dir(dir)?;
                Ok(dir.join(output_file_name(self.level, date, self.config.format)))
            }
        }
    }

    /// Render the selected time step to a single image.
    pub fn render(&self) -> JetResult<PathBuf> {
        let dataset = self.open()?;
        let time_index = match self.date {
            Some(date) => dataset.time_index_on(date)?,
            None => 0,
        };
        let (date, bytes) = self.draw(&dataset, time_index)?;
        let path = self.output_for(date)?;
        write_output(&path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Wrote map");
        Ok(path)
    }

    /// Render every time step into `DIR/YYYY-MM-DD-<level>.<ext>`.
    pub fn render_frames(&self) -> JetResult<Vec<PathBuf>> {
        let Output::Directory(dir) = &self.output else {
            return Err(JetError::invalid(
                "out-dir",
                "rendering all time steps needs an output directory",
            ));
        };
        let dataset = self.open()?;
        ensure_dir(dir)?;

        let mut written = Vec::with_capacity(dataset.times().len());
        for time_index in 0..dataset.times().len() {
            let (date, bytes) = self.draw(&dataset, time_index)?;
            let path = dir.join(format!(
                "{}-{}.{}",
                date.format("%Y-%m-%d"),
                self.level.hpa(),
                self.config.format.extension()
            ));
            write_output(&path, &bytes)?;
            debug!(path = %path.display(), frame = time_index, "Wrote frame");
            written.push(path);
        }
        info!(dir = %dir.display(), frames = written.len(), "Wrote animation frames");
        Ok(written)
    }
}

/// Create `dir` if needed; a non-directory at that path is an error.
fn ensure_dir(dir: &Path) -> JetResult<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(JetError::invalid(
            "out-dir",
            format!("{} exists and is not a directory", dir.display()),
        ));
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> JetResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles() {
        let date = NaiveDate::from_ymd_opt(2018, 4, 29).unwrap();
        assert_eq!(title_for(PressureLevel::JETSTREAM, date), "Jet Stream 2018-04-29");
        assert_eq!(
            title_for(PressureLevel::new(500).unwrap(), date),
            "Winds 500 mb 2018-04-29"
        );
        assert_eq!(
            colorbar_label(PressureLevel::JETSTREAM),
            "Wind speed at 250 mb (scaled km/h)"
        );
    }

    #[test]
    fn test_output_selection() {
        let file = Path::new("map.png");
        let dir = Path::new("maps");
        assert_eq!(
            Output::select(Some(file), Some(dir), false).unwrap(),
            Output::File(file.to_path_buf())
        );
        assert_eq!(
            Output::select(None, Some(dir), true).unwrap(),
            Output::Directory(dir.to_path_buf())
        );
        assert_eq!(
            Output::select(None, None, false).unwrap(),
            Output::Directory(PathBuf::from("."))
        );
        match Output::select(Some(file), Some(dir), true) {
            Err(JetError::InvalidParameter { param, .. }) => assert_eq!(param, "output"),
            other => panic!("expected invalid output, got {:?}", other),
        }
    }

    #[test]
    fn test_locate_in_cache() {
        let cache = tempfile::tempdir().unwrap();
        std::fs::write(cache.path().join("era.nc"), b"x").unwrap();

        let found = locate_in(Path::new("/nonexistent/dir/era.nc"), Some(cache.path())).unwrap();
        assert_eq!(found, cache.path().join("era.nc"));

        let err = locate_in(Path::new("missing.nc"), Some(cache.path())).unwrap_err();
        assert!(matches!(err, JetError::Io(_)));
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("frames");
        std::fs::write(&file, b"").unwrap();
        assert!(matches!(
            ensure_dir(&file),
            Err(JetError::InvalidParameter { .. })
        ));
        ensure_dir(&dir.path().join("new/frames")).unwrap();
    }
}
