use crate::{
    classify::{model_year_bucket, recency_bucket, ModelYear, Recency, YearTable},
    data::Listing,
    error::DigestError,
    group::{aggregate, Grouping},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub group_by_year: Grouping<ModelYear, Recency>,
    pub group_by_published_date: Grouping<Recency, ModelYear>,
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    /// Groups `listings` along both axes. `now` is used for every recency label and as the
    /// snapshot timestamp.
    pub fn build(listings: &[Listing], now: DateTime<Utc>, years: &YearTable) -> Snapshot {
        let group_by_year = aggregate(
            listings,
            |l| model_year_bucket(l, years),
            |l| recency_bucket(l, now),
        );
        let group_by_published_date = aggregate(
            listings,
            |l| recency_bucket(l, now),
            |l| model_year_bucket(l, years),
        );

        Snapshot {
            group_by_year,
            group_by_published_date,
            timestamp: now,
        }
    }

    /// Tab-indented JSON document.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DigestError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(buf)
    }

    /// Writes the document to `<dir>/<query>-<MM-DD-YYYY>.json`, replacing any earlier file.
    pub fn write(&self, dir: &Path, query: &str, date: NaiveDate) -> Result<PathBuf, DigestError> {
        let bytes = self.to_bytes()?;
        let path = dir.join(file_name(query, date));
        std::fs::write(&path, bytes)?;
        tracing::info!("Snapshot written to {}", path.display());
        Ok(path)
    }
}

/// Path separators in `query` become `-` so the name stays a single file in the output directory.
pub fn file_name(query: &str, date: NaiveDate) -> String {
    let query = query.replace(['/', '\\'], "-");
    format!("{}-{}.json", query, date.format("%m-%d-%Y"))
}
