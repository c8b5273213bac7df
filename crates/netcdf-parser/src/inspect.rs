//! Human-readable summaries of the variables in a data file.

use std::fmt;
use std::path::Path;

use jet_common::CfTimeUnits;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{get_str_attr, open_checked};

/// 1-D variables shorter than this are listed value by value.
const LIST_THRESHOLD: usize = 10;

/// Summary of one variable.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableSummary {
    /// Short 1-D variable, listed verbatim.
    Values { name: String, values: Vec<f64> },
    /// Everything else, described in one line.
    Text { name: String, text: String },
}

impl VariableSummary {
    pub fn name(&self) -> &str {
        match self {
            VariableSummary::Values { name, .. } | VariableSummary::Text { name, .. } => name,
        }
    }
}

impl fmt::Display for VariableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableSummary::Text { name, text } => write!(f, "{:<10}: {}", name, text),
            VariableSummary::Values { name, values } => {
                write!(f, "{}:", name)?;
                for value in values {
                    write!(f, "\n    {}", value)?;
                }
                Ok(())
            }
        }
    }
}

/// Summarize every variable of a data file, in file order.
pub fn summarize<P: AsRef<Path>>(path: P) -> NetCdfResult<Vec<VariableSummary>> {
    let (file, _) = open_checked(path.as_ref())?;
    let mut summaries = Vec::new();

    for var in file.variables() {
        let name = var.name();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        if name == "time" {
            summaries.push(VariableSummary::Text {
                text: describe_time(&var)?,
                name,
            });
            continue;
        }

        let summary = if shape.len() == 1 {
            let values: Vec<f64> = var.get_values(..)?;
            if values.len() < LIST_THRESHOLD {
                VariableSummary::Values { name, values }
            } else {
                let (min, max) = values
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                VariableSummary::Text {
                    name,
                    text: format!("{} values ranging from {} to {}", values.len(), min, max),
                }
            }
        } else {
            let dims: Vec<String> = shape.iter().map(|n| n.to_string()).collect();
            VariableSummary::Text {
                name,
                text: format!("array of shape ({})", dims.join(", ")),
            }
        };
        summaries.push(summary);
    }

    Ok(summaries)
}

fn describe_time(var: &netcdf::Variable) -> NetCdfResult<String> {
    let units = get_str_attr(var, "units")
        .ok_or_else(|| NetCdfError::MissingData("time units attribute".to_string()))?;
    let units =
        CfTimeUnits::parse(&units).map_err(|e| NetCdfError::InvalidFormat(e.to_string()))?;
    let raw: Vec<f64> = var.get_values(..)?;

    let (first, last) = match (raw.first(), raw.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Ok("0 values".to_string()),
    };
    let fmt_date = |t: f64| {
        units
            .to_datetime(t)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .ok_or_else(|| NetCdfError::InvalidFormat(format!("time value {} out of range", t)))
    };

    Ok(format!(
        "{} values, ranging from {} to {}",
        raw.len(),
        fmt_date(first)?,
        fmt_date(last)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_text() {
        let s = VariableSummary::Text {
            name: "u".to_string(),
            text: "array of shape (1, 1, 3, 4)".to_string(),
        };
        assert_eq!(s.to_string(), "u         : array of shape (1, 1, 3, 4)");
    }

    #[test]
    fn test_display_values() {
        let s = VariableSummary::Values {
            name: "level".to_string(),
            values: vec![250.0, 500.0],
        };
        assert_eq!(s.to_string(), "level:\n    250\n    500");
        assert_eq!(s.name(), "level");
    }
}
