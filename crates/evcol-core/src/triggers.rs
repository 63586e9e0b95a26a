//! External trigger timestamp extraction.
//!
//! Capture rigs record external trigger pulses next to the event stream as
//! `p,t` pairs (polarity 0 = rising edge, 1 = falling edge). Extraction
//! keeps one edge and writes the timestamps, one per line, for alignment
//! with frame captures.

use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// One external trigger pulse edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TriggerEvent {
    pub p: i16,
    pub t: i64,
}

/// Counts and bounds of an extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerSummary {
    pub total: usize,
    pub kept: usize,
    pub first: Option<TriggerEvent>,
    pub last: Option<TriggerEvent>,
}

/// Read `p,t` lines; blank lines, `#` comments and a `p,t` header are skipped.
pub fn read_trigger_csv(path: &Path) -> Result<Vec<TriggerEvent>, TriggerError> {
    let io_err = |source| TriggerError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(path).map_err(io_err)?);

    let mut triggers = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') || text.eq_ignore_ascii_case("p,t") {
            continue;
        }
        let parse_err = |message: String| TriggerError::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            message,
        };
        let (p, t) = text
            .split_once(',')
            .ok_or_else(|| parse_err(format!("expected 'p,t', got '{text}'")))?;
        let p = p
            .trim()
            .parse::<i16>()
            .map_err(|_| parse_err(format!("invalid polarity '{}'", p.trim())))?;
        let t = t
            .trim()
            .parse::<i64>()
            .map_err(|_| parse_err(format!("invalid timestamp '{}'", t.trim())))?;
        triggers.push(TriggerEvent { p, t });
    }
    Ok(triggers)
}

/// Keep triggers of one polarity, or all of them for `None`.
pub fn filter_by_polarity(triggers: &[TriggerEvent], polarity: Option<u8>) -> Vec<TriggerEvent> {
    match polarity {
        Some(p) => triggers
            .iter()
            .copied()
            .filter(|ev| ev.p == i16::from(p))
            .collect(),
        None => triggers.to_vec(),
    }
}

/// Write timestamps one per line, creating parent directories.
pub fn write_timestamps(path: &Path, timestamps: &[i64]) -> Result<(), TriggerError> {
    let io_err = |source| TriggerError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    for t in timestamps {
        writeln!(out, "{t}").map_err(io_err)?;
    }
    out.flush().map_err(io_err)
}

/// Read, filter and write in one step. No output file is created when the
/// input holds no triggers at all.
pub fn extract_trigger_timestamps(
    input: &Path,
    output: &Path,
    polarity: Option<u8>,
) -> Result<TriggerSummary, TriggerError> {
    let all = read_trigger_csv(input)?;
    if all.is_empty() {
        warn!(target: "triggers", input = %input.display(), "No trigger events found");
        return Ok(TriggerSummary {
            total: 0,
            kept: 0,
            first: None,
            last: None,
        });
    }

    let kept = filter_by_polarity(&all, polarity);
    let timestamps: Vec<i64> = kept.iter().map(|ev| ev.t).collect();
    write_timestamps(output, &timestamps)?;

    let summary = TriggerSummary {
        total: all.len(),
        kept: kept.len(),
        first: all.first().copied(),
        last: all.last().copied(),
    };
    info!(
        target: "triggers",
        input = %input.display(),
        output = %output.display(),
        total = summary.total,
        kept = summary.kept,
        "Extracted trigger timestamps"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ev(p: i16, t: i64) -> TriggerEvent {
        TriggerEvent { p, t }
    }

    #[test]
    fn filter_keeps_requested_edge() {
        let all = vec![ev(0, 10), ev(1, 20), ev(0, 30)];
        assert_eq!(filter_by_polarity(&all, Some(0)), vec![ev(0, 10), ev(0, 30)]);
        assert_eq!(filter_by_polarity(&all, Some(1)), vec![ev(1, 20)]);
        assert_eq!(filter_by_polarity(&all, None).len(), 3);
    }

    #[test]
    fn extract_writes_one_timestamp_per_line() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("triggers.csv");
        let output = dir.path().join("ts").join("1.txt");
        fs::write(&input, "p,t\n0,100\n1,150\n0,200\n").unwrap();

        let summary = extract_trigger_timestamps(&input, &output, Some(0)).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.kept, 2);
        assert_eq!(summary.first, Some(ev(0, 100)));
        assert_eq!(summary.last, Some(ev(0, 200)));
        assert_eq!(fs::read_to_string(&output).unwrap(), "100\n200\n");
    }

    #[test]
    fn no_triggers_means_no_output_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("triggers.csv");
        let output = dir.path().join("1.txt");
        fs::write(&input, "# nothing recorded\n").unwrap();

        let summary = extract_trigger_timestamps(&input, &output, Some(0)).unwrap();
        assert_eq!(summary.total, 0);
        assert!(!output.exists());
    }

    #[test]
    fn malformed_line_reports_position() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("triggers.csv");
        fs::write(&input, "0,100\n0;200\n").unwrap();
        let err = read_trigger_csv(&input).unwrap_err();
        assert!(matches!(err, TriggerError::Parse { line: 2, .. }));
    }
}
