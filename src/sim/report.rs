// # Report Writers
//
// Output file naming and formats follow the reference simulator so existing
// gnuplot tooling keeps working: the curve file carries one
// `<cache_size>  <hit_rate>` line per simulated size, the samples file one
// `<total_refs> <occupancy>` line per sample of the last size.

use crate::error::Result;
use crate::sim::driver::{CurvePoint, Sample, SimReport};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

// ============================================================================
// Output Paths
// ============================================================================

fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// `<prefix>.trc`
pub fn trace_path(prefix: &Path) -> PathBuf {
    suffixed(prefix, ".trc")
}

/// `<prefix>.par`
pub fn params_path(prefix: &Path) -> PathBuf {
    suffixed(prefix, ".par")
}

/// `<prefix>_<POLICY>.cuv`
pub fn curve_path(prefix: &Path, policy: &str) -> PathBuf {
    suffixed(prefix, &format!("_{}.cuv", policy))
}

/// `<prefix>_<POLICY>.sln`
pub fn samples_path(prefix: &Path, policy: &str) -> PathBuf {
    suffixed(prefix, &format!("_{}.sln", policy))
}

// ============================================================================
// Writers
// ============================================================================

/// Hit-rate curve, one decimal place per line.
pub fn write_curve<W: Write>(mut writer: W, curve: &[CurvePoint]) -> Result<()> {
    for point in curve {
        writeln!(writer, "{:5}  {:.1}", point.capacity, point.hit_rate)?;
    }
    Ok(())
}

/// Stack-occupancy samples, two decimal places per line.
pub fn write_samples<W: Write>(mut writer: W, samples: &[Sample]) -> Result<()> {
    for sample in samples {
        writeln!(writer, "{:4} {:.2}", sample.total_refs, sample.occupancy)?;
    }
    Ok(())
}

/// Write both output files for a finished simulation.
pub fn write_report(prefix: &Path, report: &SimReport) -> Result<()> {
    let mut curve = BufWriter::new(File::create(curve_path(prefix, report.policy))?);
    write_curve(&mut curve, &report.curve)?;
    curve.flush()?;

    let mut samples = BufWriter::new(File::create(samples_path(prefix, report.policy))?);
    write_samples(&mut samples, &report.last_samples)?;
    samples.flush()?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths() {
        let prefix = Path::new("traces/web2");
        assert_eq!(trace_path(prefix), PathBuf::from("traces/web2.trc"));
        assert_eq!(params_path(prefix), PathBuf::from("traces/web2.par"));
        assert_eq!(
            curve_path(prefix, "LIRS"),
            PathBuf::from("traces/web2_LIRS.cuv")
        );
        assert_eq!(
            samples_path(prefix, "LIRS"),
            PathBuf::from("traces/web2_LIRS.sln")
        );
    }

    #[test]
    fn test_curve_format() {
        let curve = [
            CurvePoint {
                capacity: 100,
                hit_rate: 41.25,
            },
            CurvePoint {
                capacity: 1000,
                hit_rate: 66.666,
            },
        ];
        let mut out = Vec::new();
        write_curve(&mut out, &curve).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "  100  41.2\n 1000  66.7\n"
        );
    }

    #[test]
    fn test_samples_format() {
        let samples = [
            Sample {
                total_refs: 500,
                occupancy: 1.2345,
            },
            Sample {
                total_refs: 12000,
                occupancy: 2.5,
            },
        ];
        let mut out = Vec::new();
        write_samples(&mut out, &samples).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), " 500 1.23\n12000 2.50\n");
    }
}
