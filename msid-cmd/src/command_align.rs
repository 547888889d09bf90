use anyhow::{Context, Result};
use msid::{msid_from_path, read_times, Alignment};
use ndarray::Array1;
use serde::Serialize;
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct ChannelReport {
    path: PathBuf,
    msid: String,
    samples: usize,
}

#[derive(Debug, Serialize)]
struct CandidateReport {
    #[serde(flatten)]
    channel: ChannelReport,
    /// Candidate samples with a matching reference timestamp
    matched: usize,
    /// Reference samples with a matching candidate timestamp
    reference_matched: usize,
}

#[derive(Debug, Serialize)]
struct Report {
    reference: ChannelReport,
    candidates: Vec<CandidateReport>,
}

fn load(path: &Path, column: &str) -> Result<Array1<f64>> {
    let times = read_times(path, column).with_context(|| format!("reading {path:?}"))?;
    Ok(Array1::from(times))
}

pub fn align<W: Write>(
    reference: &Path,
    candidates: &[PathBuf],
    column: &str,
    mut writer: W,
) -> Result<()> {
    let ref_times = load(reference, column)?;
    let mut report = Report {
        reference: ChannelReport {
            path: reference.to_path_buf(),
            msid: msid_from_path(reference),
            samples: ref_times.len(),
        },
        candidates: Vec::default(),
    };

    for path in candidates {
        let times = load(path, column)?;
        let alignment = Alignment::new(ref_times.view(), times.view());
        let msid = msid_from_path(path);
        let matched = alignment.candidate_matches();
        if matched < times.len() {
            warn!(
                "{} of {} {msid} samples have no matching reference timestamp",
                times.len() - matched,
                times.len()
            );
        } else {
            info!("all {} {msid} samples match", times.len());
        }
        report.candidates.push(CandidateReport {
            channel: ChannelReport {
                path: path.clone(),
                msid,
                samples: times.len(),
            },
            matched,
            reference_matched: alignment.reference_matches(),
        });
    }

    serde_json::to_writer_pretty(&mut writer, &report)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod test {
    use std::fs::write;

    use serde_json::Value;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_align() {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("Point_SunCentAng_5min_lifetime.csv");
        let candidate = dir.path().join("2CE00ATM_5min_lifetime.csv");
        write(&reference, "times,vals\n0,1\n300,2\n600,3\n900,4\n").unwrap();
        write(&candidate, "times,maxes\n300,20\n900,21\n1200,22\n").unwrap();

        let mut out: Vec<u8> = Vec::default();
        align(&reference, &[candidate], "times", &mut out).unwrap();

        let report: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(report["reference"]["msid"], "Point_SunCentAng");
        assert_eq!(report["reference"]["samples"], 4);
        let candidate = &report["candidates"][0];
        assert_eq!(candidate["msid"], "2CE00ATM");
        assert_eq!(candidate["samples"], 3);
        assert_eq!(candidate["matched"], 2);
        assert_eq!(candidate["reference_matched"], 2);
    }

    #[test]
    fn test_align_missing_column() {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("ref.csv");
        write(&reference, "tstart\n0\n").unwrap();

        let mut out: Vec<u8> = Vec::default();
        assert!(align(&reference, &[reference.clone()], "times", &mut out).is_err());
    }
}
