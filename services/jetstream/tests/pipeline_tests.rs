//! End-to-end tests: sample data files through to written images.

use std::path::{Path, PathBuf};

use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use jet_common::{JetError, PressureLevel, Region};
use jetstream::{Fetcher, Output, ProviderConfig, RenderJob, RequestOptions, Resolver};
use renderer::{ImageFormat, RenderConfig};
use test_utils::{
    temp_test_dir, write_bytes, write_sample_netcdf, write_truncated_copy, SampleSpec,
    HTML_ERROR_PAGE,
};

fn sample_file(dir: &Path, spec: &SampleSpec) -> PathBuf {
    let path = dir.join("era-interim.nc");
    write_sample_netcdf(&path, spec).unwrap();
    path
}

fn small_config() -> RenderConfig {
    RenderConfig {
        dpi: 40,
        ..Default::default()
    }
}

fn job(data_path: PathBuf, output: Output) -> RenderJob {
    RenderJob {
        data_path,
        level: PressureLevel::JETSTREAM,
        region: None,
        date: None,
        speed_factor: None,
        output,
        config: small_config(),
    }
}

fn png_size(bytes: &[u8]) -> (u32, u32) {
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    (
        u32::from_be_bytes(bytes[16..20].try_into().unwrap()),
        u32::from_be_bytes(bytes[20..24].try_into().unwrap()),
    )
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(true)
}

// ============================================================================
// Single images
// ============================================================================

#[test]
fn test_render_named_by_level_and_date() {
    let dir = temp_test_dir();
    let data = sample_file(dir.path(), &SampleSpec::era_interim_coarse());
    let out = dir.path().join("maps");

    let path = job(data, Output::Directory(out.clone())).render().unwrap();
    assert_eq!(path, out.join("jetstream-2018-04-29.png"));

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(png_size(&bytes), (256, 192));
}

#[test]
fn test_render_other_level_and_date() {
    let dir = temp_test_dir();
    let data = sample_file(dir.path(), &SampleSpec::era_interim_coarse());
    let out = dir.path().join("maps");

    let mut job = job(data, Output::Directory(out.clone()));
    job.level = PressureLevel::new(500).unwrap();
    job.date = NaiveDate::from_ymd_opt(2018, 4, 30);
    job.region = Some(Region::Europe.bbox());
    job.config.format = ImageFormat::Webp;

    let path = job.render().unwrap();
    assert_eq!(path, out.join("winds-500hPa-2018-04-30.webp"));
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn test_render_is_deterministic() {
    let dir = temp_test_dir();
    let data = sample_file(dir.path(), &SampleSpec::era_interim_coarse().packed());
    let a = dir.path().join("a.png");
    let b = dir.path().join("b.png");

    job(data.clone(), Output::File(a.clone())).render().unwrap();
    job(data, Output::File(b.clone())).render().unwrap();
    assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
}

#[test]
fn test_render_with_fill_cells() {
    let dir = temp_test_dir();
    let data = sample_file(
        dir.path(),
        &SampleSpec::era_interim_coarse().packed().with_fill_cells(60),
    );
    let out = dir.path().join("fill.png");
    job(data, Output::File(out.clone())).render().unwrap();
    assert_eq!(png_size(&std::fs::read(out).unwrap()), (256, 192));
}

// ============================================================================
// Animation frames
// ============================================================================

#[test]
fn test_render_frames() {
    let dir = temp_test_dir();
    let data = sample_file(dir.path(), &SampleSpec::era_interim_coarse());
    let frames = dir.path().join("frames");

    let written = job(data, Output::Directory(frames.clone()))
        .render_frames()
        .unwrap();
    assert_eq!(
        written,
        vec![frames.join("2018-04-29-250.png"), frames.join("2018-04-30-250.png")]
    );
    assert!(written.iter().all(|p| p.is_file()));
}

#[test]
fn test_frames_need_a_directory() {
    let dir = temp_test_dir();
    let data = sample_file(dir.path(), &SampleSpec::era_interim_coarse());
    let file = write_bytes(dir.path(), "frames", b"");

    let err = job(data.clone(), Output::Directory(file))
        .render_frames()
        .unwrap_err();
    assert!(matches!(err, JetError::InvalidParameter { .. }));

    let err = job(data, Output::File(dir.path().join("x.png")))
        .render_frames()
        .unwrap_err();
    assert!(matches!(err, JetError::InvalidParameter { .. }));
}

// ============================================================================
// Failures write nothing
// ============================================================================

#[test]
fn test_malformed_files_are_parse_errors() {
    let dir = temp_test_dir();
    let good = sample_file(dir.path(), &SampleSpec::era_interim_coarse());
    let truncated = write_truncated_copy(&good, dir.path(), "truncated.nc", 512);
    let html = write_bytes(dir.path(), "error.nc", HTML_ERROR_PAGE);
    let no_times = dir.path().join("no-times.nc");
    write_sample_netcdf(&no_times, &SampleSpec::era_interim_coarse().without_times()).unwrap();

    for data in [truncated, html, no_times] {
        let out = temp_test_dir();
        let err = job(data.clone(), Output::Directory(out.path().to_path_buf()))
            .render()
            .unwrap_err();
        assert!(matches!(err, JetError::Parse(_)), "{}: {:?}", data.display(), err);
        assert!(dir_is_empty(out.path()), "output written for {}", data.display());
    }
}

#[test]
fn test_missing_level_and_date_are_parse_errors() {
    let dir = temp_test_dir();
    let data = sample_file(dir.path(), &SampleSpec::era_interim_coarse());
    let out = temp_test_dir();

    let mut missing_level = job(data.clone(), Output::Directory(out.path().to_path_buf()));
    missing_level.level = PressureLevel::new(850).unwrap();
    assert!(matches!(missing_level.render(), Err(JetError::Parse(_))));

    let mut missing_date = job(data, Output::Directory(out.path().to_path_buf()));
    missing_date.date = NaiveDate::from_ymd_opt(2018, 5, 15);
    assert!(matches!(missing_date.render(), Err(JetError::Parse(_))));

    assert!(dir_is_empty(out.path()));
}

#[test]
fn test_invalid_plot_config_is_render_error() {
    let dir = temp_test_dir();
    let data = sample_file(dir.path(), &SampleSpec::era_interim_coarse());
    let out = temp_test_dir();

    let mut bad_range = job(data.clone(), Output::Directory(out.path().to_path_buf()));
    bad_range.config.vmin = 300.0;
    assert!(matches!(bad_range.render(), Err(JetError::Render(_))));

    let mut zero_size = job(data.clone(), Output::Directory(out.path().to_path_buf()));
    zero_size.config.dpi = 0;
    assert!(matches!(zero_size.render(), Err(JetError::Render(_))));

    let mut off_data = job(data, Output::Directory(out.path().to_path_buf()));
    off_data.region = Some(jet_common::BoundingBox::new(10.0, 91.0, 20.0, 95.0));
    assert!(matches!(off_data.render(), Err(JetError::Render(_))));

    assert!(dir_is_empty(out.path()));
}

#[test]
fn test_missing_data_file_is_io_error() {
    let out = temp_test_dir();
    let err = job(
        PathBuf::from("/nonexistent/jetstream-test/no-such-file.nc"),
        Output::Directory(out.path().to_path_buf()),
    )
    .render()
    .unwrap_err();
    assert!(matches!(err, JetError::Io(_)));
}

// ============================================================================
// Resolve, fetch, render
// ============================================================================

#[tokio::test]
async fn test_run_global_jet_stream_example() {
    let dir = temp_test_dir();
    let data = sample_file(dir.path(), &SampleSpec::era_interim_coarse());
    let payload = std::fs::read(&data).unwrap();

    let app = Router::new().route("/retrieve", get(move || async move { payload }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let provider = ProviderConfig {
        endpoint: Some(format!("http://{}/retrieve", addr)),
        ..Default::default()
    };
    let out_dir = dir.path().join("out");
    let options = RequestOptions {
        out_dir: Some(out_dir.clone()),
        ..RequestOptions::for_date("2018-04-29", dir.path().join("scratch"))
    };
    let today = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
    let request = Resolver::new(&provider, today).resolve(&options).unwrap();

    let outcome = Fetcher::new(&provider).unwrap().fetch(&request).await.unwrap();

    let job = RenderJob {
        data_path: outcome.path,
        level: request.level(),
        region: Some(request.region().bbox()),
        date: Some(request.date()),
        speed_factor: None,
        output: Output::File(request.output_path().to_path_buf()),
        config: small_config(),
    };
    let path = tokio::task::spawn_blocking(move || job.render())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(path, out_dir.join("jetstream-2018-04-29.png"));
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}
