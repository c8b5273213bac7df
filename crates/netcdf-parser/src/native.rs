//! Low-level helpers around the native netcdf library.
//!
//! The netcdf crate wraps libnetcdf (and HDF5 for netCDF-4 files). These
//! helpers sniff the file signature before handing a path to the C library,
//! and read attributes without triggering HDF5 diagnostics.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Once;

use crate::error::{NetCdfError, NetCdfResult};

/// On-disk flavour of a NetCDF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Classic format (CDF1)
    Classic,
    /// 64-bit offset format (CDF2)
    Offset64,
    /// 64-bit data format (CDF5)
    Data64,
    /// netCDF-4 (HDF5 container)
    Hdf5,
}

const HDF5_SIGNATURE: &[u8; 8] = b"\x89HDF\r\n\x1a\n";

/// Identify the file format from its leading bytes.
///
/// Anything that is not a NetCDF signature (HTML error pages, GRIB files,
/// empty or truncated downloads) is rejected here.
pub fn sniff_format(path: &Path) -> NetCdfResult<FileFormat> {
    let mut header = [0u8; 8];
    let mut file = File::open(path)?;
    let mut read = 0;
    while read < header.len() {
        let n = file.read(&mut header[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }

    if read >= 4 && &header[..3] == b"CDF" {
        return match header[3] {
            1 => Ok(FileFormat::Classic),
            2 => Ok(FileFormat::Offset64),
            5 => Ok(FileFormat::Data64),
            v => Err(NetCdfError::InvalidFormat(format!(
                "unknown NetCDF classic version byte {}",
                v
            ))),
        };
    }
    if read == header.len() && &header == HDF5_SIGNATURE {
        return Ok(FileFormat::Hdf5);
    }

    Err(NetCdfError::InvalidFormat(format!(
        "{} is not a NetCDF file ({} leading bytes do not match a NetCDF signature)",
        path.display(),
        read
    )))
}

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This disables that output by calling
/// H5Eset_auto2 with null handlers. Safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Check the signature, then open the file with the native library.
pub fn open_checked(path: &Path) -> NetCdfResult<(netcdf::File, FileFormat)> {
    let format = sniff_format(path)?;
    silence_hdf5_errors();
    let file = netcdf::open(path).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
    })?;
    Ok((file, format))
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
pub(crate) fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

pub(crate) fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

pub(crate) fn get_str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Names of a variable's dimensions, in order.
pub(crate) fn dimension_names(var: &netcdf::Variable) -> Vec<String> {
    var.dimensions().iter().map(|d| d.name()).collect()
}

/// Find the first variable whose name matches one of `candidates`.
pub(crate) fn find_variable<'f>(
    file: &'f netcdf::File,
    candidates: &[&str],
) -> Option<netcdf::Variable<'f>> {
    candidates.iter().find_map(|name| file.variable(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_sniff_classic() {
        let f = write_temp(b"CDF\x01\x00\x00\x00\x00");
        assert_eq!(sniff_format(f.path()).unwrap(), FileFormat::Classic);
        let f = write_temp(b"CDF\x02");
        assert_eq!(sniff_format(f.path()).unwrap(), FileFormat::Offset64);
    }

    #[test]
    fn test_sniff_hdf5() {
        let f = write_temp(b"\x89HDF\r\n\x1a\n\x00\x00");
        assert_eq!(sniff_format(f.path()).unwrap(), FileFormat::Hdf5);
    }

    #[test]
    fn test_sniff_rejects_html_and_empty() {
        let f = write_temp(b"<html><body>Not found</body></html>");
        assert!(matches!(
            sniff_format(f.path()),
            Err(NetCdfError::InvalidFormat(_))
        ));
        let f = write_temp(b"");
        assert!(matches!(
            sniff_format(f.path()),
            Err(NetCdfError::InvalidFormat(_))
        ));
        let f = write_temp(b"\x89HDF");
        assert!(matches!(
            sniff_format(f.path()),
            Err(NetCdfError::InvalidFormat(_))
        ));
    }
}
