//! Tests for regions, bounding boxes and pressure levels.

use jet_common::bbox::{BboxParseError, BoundingBox, Region};
use jet_common::level::{PressureLevel, SUPPORTED_LEVELS};

// ============================================================================
// Region parsing tests
// ============================================================================

#[test]
fn test_region_presets() {
    for name in Region::PRESETS {
        let region = Region::parse(name).unwrap();
        assert!(region.bbox().validate_geographic().is_ok(), "{}", name);
        assert_eq!(&region.name(), name);
    }
}

#[test]
fn test_region_case_insensitive() {
    assert_eq!(Region::parse("GLOBAL").unwrap(), Region::Global);
    assert_eq!(Region::parse(" Europe ").unwrap(), Region::Europe);
}

#[test]
fn test_region_custom_bbox() {
    let region = Region::parse("-30,20,40,70").unwrap();
    assert_eq!(
        region,
        Region::Custom(BoundingBox::new(-30.0, 20.0, 40.0, 70.0))
    );
}

#[test]
fn test_region_antimeridian_in_0_360() {
    let region = Region::parse("120,-60,240,60").unwrap();
    assert_eq!(region.bbox().width(), 120.0);
}

#[test]
fn test_region_unknown_name() {
    assert!(matches!(
        Region::parse("atlantis"),
        Err(BboxParseError::InvalidFormat(_))
    ));
}

// ============================================================================
// Bounding box validation tests
// ============================================================================

#[test]
fn test_bbox_inverted_rejected() {
    assert!(matches!(
        BoundingBox::from_bbox_string("10,10,5,5"),
        Err(BboxParseError::Inverted(_))
    ));
}

#[test]
fn test_bbox_latitude_out_of_range() {
    assert!(matches!(
        BoundingBox::from_bbox_string("0,-95,10,10"),
        Err(BboxParseError::OutOfRange(_))
    ));
}

#[test]
fn test_bbox_not_a_number() {
    assert!(matches!(
        BoundingBox::from_bbox_string("0,a,10,10"),
        Err(BboxParseError::InvalidNumber(_))
    ));
    assert!(matches!(
        BoundingBox::from_bbox_string("0,NaN,10,10"),
        Err(BboxParseError::InvalidNumber(_))
    ));
}

#[test]
fn test_global_mars_area() {
    assert_eq!(Region::Global.bbox().to_mars_area(), "90/-180/-90/180");
}

#[test]
fn test_fractional_mars_area() {
    let bbox = BoundingBox::new(-10.5, 20.25, 30.0, 40.0);
    assert_eq!(bbox.to_mars_area(), "40/-10.5/20.25/30");
}

// ============================================================================
// Pressure level tests
// ============================================================================

#[test]
fn test_every_supported_level_parses() {
    for hpa in SUPPORTED_LEVELS {
        let level = PressureLevel::parse(&format!("{}hPa", hpa)).unwrap();
        assert_eq!(level.hpa(), *hpa);
    }
}

#[test]
fn test_levels_outside_set_rejected() {
    for hpa in [0u16, 4, 249, 251, 1001, 1013] {
        assert!(PressureLevel::new(hpa).is_err(), "{}", hpa);
    }
}

#[test]
fn test_level_display() {
    assert_eq!(PressureLevel::JETSTREAM.to_string(), "250 hPa");
}
