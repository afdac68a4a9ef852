use crate::error::ExperimentError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use twostep_core::TrialRecord;

/// Writes the header and one row per record
pub fn write_csv<W: Write>(mut out: W, records: &[TrialRecord]) -> Result<(), ExperimentError> {
    writeln!(out, "{}", TrialRecord::HEADER.join(","))?;
    for record in records {
        writeln!(out, "{}", record.fields().join(","))?;
    }
    out.flush()?;
    Ok(())
}

/// Saves the history to `<base>.csv` and returns the path written
pub fn save_history(base: &str, records: &[TrialRecord]) -> Result<PathBuf, ExperimentError> {
    let path = PathBuf::from(format!("{base}.csv"));
    let file = File::create(&path)?;
    write_csv(BufWriter::new(file), records)?;
    tracing::info!(path = %path.display(), rows = records.len(), "history saved");
    Ok(path)
}
