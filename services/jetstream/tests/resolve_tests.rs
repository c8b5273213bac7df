//! Tests for request resolution.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use jet_common::{JetError, Region};
use jet_common::level::SUPPORTED_LEVELS;
use jetstream::{ProviderConfig, RequestOptions, Resolver};
use renderer::ImageFormat;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

fn options(date: &str) -> RequestOptions {
    RequestOptions::for_date(date, "/tmp/jetstream-scratch")
}

fn assert_invalid(result: Result<jetstream::RequestDescriptor, JetError>, param: &str) {
    match result {
        Err(JetError::InvalidParameter { param: p, .. }) => assert_eq!(p, param),
        other => panic!("expected invalid '{}', got {:?}", param, other),
    }
}

// ============================================================================
// Descriptor contents
// ============================================================================

#[test]
fn test_jet_stream_example() {
    let provider = ProviderConfig::default();
    let resolver = Resolver::new(&provider, today());
    let req = resolver.resolve(&options("2018-04-29")).unwrap();

    assert_eq!(req.date(), NaiveDate::from_ymd_opt(2018, 4, 29).unwrap());
    assert_eq!(req.level().hpa(), 250);
    assert_eq!(req.region(), Region::Global);
    assert_eq!(req.format(), ImageFormat::Png);
    assert_eq!(req.output_path(), Path::new("./jetstream-2018-04-29.png"));
    assert_eq!(
        req.scratch_path(),
        Path::new("/tmp/jetstream-scratch/windspeed-2018-04-29-to-2018-04-29-250-global.nc")
    );
}

#[test]
fn test_query_parameters() {
    let provider = ProviderConfig::default();
    let req = Resolver::new(&provider, today())
        .resolve(&options("2018-04-29"))
        .unwrap();

    let expected = [
        ("class", "ei"),
        ("dataset", "interim"),
        ("date", "2018-04-29/to/2018-04-29"),
        ("expver", "1"),
        ("grid", "0.75/0.75"),
        ("levelist", "250"),
        ("levtype", "pl"),
        ("param", "131.128/132.128"),
        ("step", "0"),
        ("stream", "oper"),
        ("time", "18:00:00"),
        ("area", "90/-180/-90/180"),
        ("type", "an"),
        ("format", "netcdf"),
    ];
    for (key, value) in expected {
        assert_eq!(req.query_value(key), Some(value), "{}", key);
    }
    assert_eq!(req.query().len(), expected.len());
    assert_eq!(req.endpoint(), "https://api.ecmwf.int/v1/datasets/interim");
}

#[test]
fn test_other_level_and_webp() {
    let provider = ProviderConfig::default();
    let opts = RequestOptions {
        level: "775mb".to_string(),
        format: "webp".to_string(),
        region: "north-america".to_string(),
        out_dir: Some(PathBuf::from("/srv/maps")),
        ..options("2018-01-01")
    };
    let req = Resolver::new(&provider, today()).resolve(&opts).unwrap();
    assert_eq!(
        req.output_path(),
        Path::new("/srv/maps/winds-775hPa-2018-01-01.webp")
    );
    assert_eq!(req.query_value("area"), Some("62/-138/15/-55"));
    assert_eq!(req.query_value("levelist"), Some("775"));
}

#[test]
fn test_explicit_output_wins() {
    let provider = ProviderConfig::default();
    let opts = RequestOptions {
        output: Some(PathBuf::from("map.png")),
        out_dir: Some(PathBuf::from("/ignored")),
        ..options("2018-04-29")
    };
    let req = Resolver::new(&provider, today()).resolve(&opts).unwrap();
    assert_eq!(req.output_path(), Path::new("map.png"));
}

#[test]
fn test_date_range() {
    let provider = ProviderConfig::default();
    let opts = RequestOptions {
        until: Some("2018-05-03".to_string()),
        ..options("2018-04-29")
    };
    let req = Resolver::new(&provider, today()).resolve(&opts).unwrap();
    assert_eq!(req.dates().days(), 5);
    assert_eq!(req.query_value("date"), Some("2018-04-29/to/2018-05-03"));
    // The map shows the first day.
    assert_eq!(req.output_path(), Path::new("./jetstream-2018-04-29.png"));
}

#[test]
fn test_every_supported_level_resolves() {
    let provider = ProviderConfig::default();
    let resolver = Resolver::new(&provider, today());
    for hpa in SUPPORTED_LEVELS {
        let opts = RequestOptions {
            level: hpa.to_string(),
            ..options("1999-12-31")
        };
        let req = resolver.resolve(&opts).unwrap();
        assert!(!req.output_path().as_os_str().is_empty());
        assert!(!req.scratch_path().as_os_str().is_empty());
        assert!(!req.endpoint().is_empty());
        assert!(req.query().iter().all(|(k, v)| !k.is_empty() && !v.is_empty()));
        assert!(req.date() >= provider.first_date);
        assert!(Some(req.date()) <= provider.last_date);
    }
}

// ============================================================================
// Rejections
// ============================================================================

#[test]
fn test_unsupported_levels_rejected() {
    let provider = ProviderConfig::default();
    let resolver = Resolver::new(&provider, today());
    for level in ["260", "0", "1013", "high", "-250"] {
        let opts = RequestOptions {
            level: level.to_string(),
            ..options("2018-04-29")
        };
        assert_invalid(resolver.resolve(&opts), "level");
    }
}

#[test]
fn test_dates_outside_window_rejected() {
    let provider = ProviderConfig::default();
    let resolver = Resolver::new(&provider, today());
    assert_invalid(resolver.resolve(&options("1978-12-31")), "date");
    assert_invalid(resolver.resolve(&options("2019-09-01")), "date");
    assert_invalid(resolver.resolve(&options("29/04/2018")), "date");
    assert!(resolver.resolve(&options("1979-01-01")).is_ok());
    assert!(resolver.resolve(&options("2019-08-31")).is_ok());
}

#[test]
fn test_publication_lag() {
    let provider = ProviderConfig {
        last_date: None,
        publication_lag_days: 5,
        ..Default::default()
    };
    let resolver = Resolver::new(&provider, today());
    assert!(resolver.resolve(&options("2026-01-10")).is_ok());
    assert_invalid(resolver.resolve(&options("2026-01-11")), "date");
}

#[test]
fn test_bad_ranges_rejected() {
    let provider = ProviderConfig::default();
    let resolver = Resolver::new(&provider, today());
    let inverted = RequestOptions {
        until: Some("2018-04-28".to_string()),
        ..options("2018-04-29")
    };
    assert_invalid(resolver.resolve(&inverted), "until");

    let beyond = RequestOptions {
        until: Some("2019-09-02".to_string()),
        ..options("2019-08-30")
    };
    assert_invalid(resolver.resolve(&beyond), "until");
}

#[test]
fn test_bad_regions_and_formats_rejected() {
    let provider = ProviderConfig::default();
    let resolver = Resolver::new(&provider, today());
    for region in ["atlantis", "10,20,5,30", "0,-95,10,10", "-200,0,0,10", "1,2,3"] {
        let opts = RequestOptions {
            region: region.to_string(),
            ..options("2018-04-29")
        };
        assert_invalid(resolver.resolve(&opts), "region");
    }
    let opts = RequestOptions {
        format: "gif".to_string(),
        ..options("2018-04-29")
    };
    assert_invalid(resolver.resolve(&opts), "format");
}
