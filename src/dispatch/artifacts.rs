//! Interchange artifact serialization.
//!
//! One artifact per category, row-oriented: one record per line, fields
//! comma-separated in the category's fixed order, booleans as `0`/`1`, no
//! header. The external pipeline and the gateway share exactly this schema
//! per category, so the field order here must never change independently of
//! the pipeline.
//!
//! Field orders:
//! - who:         `region_code,deaths,population,recovered,vaccinated,date`
//! - hospital:    `hospital_id,date,admitted,age,sex,region_code,symptom1..symptom4`
//! - secretariat: `diagnosis,vaccinated,region_code,education,population,date`

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::types::{Category, Record};

use super::runner::DispatchError;

/// Path of one cycle's artifact for a category.
pub fn artifact_path(dir: &Path, cycle: u64, category: Category) -> PathBuf {
    dir.join(format!("cycle-{cycle:06}-{category}.csv"))
}

/// Render a category's records into artifact rows.
///
/// Records of a different category are ignored; the coordinator only ever
/// passes homogeneous slices.
pub fn render_rows(records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        match record {
            Record::Who(r) => {
                let _ = writeln!(
                    out,
                    "{},{},{},{},{},{}",
                    r.region_code, r.deaths, r.population, r.recovered, r.vaccinated, r.date
                );
            }
            Record::Hospital(r) => {
                let _ = writeln!(
                    out,
                    "{},{},{},{},{},{},{},{},{},{}",
                    r.hospital_id,
                    r.date,
                    flag(r.admitted),
                    r.age,
                    r.sex,
                    r.region_code,
                    flag(r.symptoms[0]),
                    flag(r.symptoms[1]),
                    flag(r.symptoms[2]),
                    flag(r.symptoms[3]),
                );
            }
            Record::Secretariat(r) => {
                let _ = writeln!(
                    out,
                    "{},{},{},{},{},{}",
                    flag(r.diagnosis),
                    flag(r.vaccinated),
                    r.region_code,
                    r.education,
                    r.population,
                    r.date
                );
            }
        }
    }
    out
}

fn flag(b: bool) -> u8 {
    u8::from(b)
}

/// Write one artifact per category in canonical order, returning the paths
/// in that same order (the external pipeline's argv).
///
/// A write failure aborts dispatch; any artifacts already written are left
/// for the caller's cleanup pass.
pub async fn write_artifacts(
    dir: &Path,
    cycle: u64,
    per_category: &[Vec<Record>; Category::COUNT],
) -> Result<Vec<PathBuf>, DispatchError> {
    let mut paths = Vec::with_capacity(Category::COUNT);

    for category in Category::ALL {
        let path = artifact_path(dir, cycle, category);
        let rows = render_rows(&per_category[category.index()]);

        tokio::fs::write(&path, rows.as_bytes())
            .await
            .map_err(|source| DispatchError::ArtifactWrite {
                path: path.clone(),
                source,
            })?;

        debug!(
            cycle = cycle,
            category = %category,
            records = per_category[category.index()].len(),
            path = %path.display(),
            "Interchange artifact written"
        );
        paths.push(path);
    }

    Ok(paths)
}

/// Best-effort artifact removal. A missing file is not an error; any other
/// failure is logged and swallowed.
pub async fn remove_artifacts(paths: &[PathBuf]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove interchange artifact");
            }
        }
    }
}

/// Remove stale `cycle-*.csv` artifacts left behind by a previous run.
///
/// Called once at startup; the gateway holds no durable state, so anything
/// matching the artifact naming scheme is garbage from a crashed process.
pub fn clean_artifact_dir(dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("cycle-") && name.ends_with(".csv") {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
