use crate::{error::VcxError, utils::util::Result};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::sync::OnceLock;

/// One parsed VCF data line.
///
/// Only the eight fixed columns are materialised eagerly; the `INFO` map is
/// derived on first access, and `FORMAT`/sample columns are captured when the
/// line carries them. Serialization emits the canonical eight JSON keys.
#[derive(Debug, Serialize)]
pub struct Row {
    #[serde(rename = "CHROM")]
    pub chrom: String,
    #[serde(rename = "POS")]
    pub pos: u64,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "REF")]
    pub ref_allele: String,
    #[serde(rename = "ALT")]
    pub alt: String,
    #[serde(rename = "QUAL", serialize_with = "serialize_qual")]
    pub qual: Option<f64>,
    #[serde(rename = "FILTER")]
    pub filter: String,
    #[serde(rename = "INFO")]
    pub info: String,
    #[serde(skip)]
    pub format: Option<String>,
    #[serde(skip)]
    pub samples: Vec<String>,
    #[serde(skip)]
    info_fields: OnceLock<HashMap<String, String>>,
}

// The host-facing JSON keeps the original tool's shape: a missing QUAL is
// emitted as the number 0, not null.
fn serialize_qual<S>(qual: &Option<f64>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(qual.unwrap_or(0.0))
}

impl Row {
    /// Parses one trimmed data line. Lines with fewer than eight tab-separated
    /// fields or a non-integer `POS` are malformed; a `.` (or otherwise
    /// unparseable) `QUAL` is preserved as missing.
    pub fn parse(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        let parts: Vec<&str> = trimmed.split('\t').collect();
        if parts.len() < 8 {
            return Err(VcxError::malformed_row(format!(
                "expected at least 8 tab-separated fields, got {}",
                parts.len()
            )));
        }

        let pos = parts[1].parse::<u64>().map_err(|_| {
            VcxError::malformed_row(format!("POS is not a non-negative integer: {}", parts[1]))
        })?;
        let qual = match parts[5] {
            "." => None,
            text => text.parse::<f64>().ok(),
        };

        Ok(Self {
            chrom: parts[0].to_string(),
            pos,
            id: parts[2].to_string(),
            ref_allele: parts[3].to_string(),
            alt: parts[4].to_string(),
            qual,
            filter: parts[6].to_string(),
            info: parts[7].to_string(),
            format: parts.get(8).map(|format| format.to_string()),
            samples: parts
                .get(9..)
                .unwrap_or_default()
                .iter()
                .map(|sample| sample.to_string())
                .collect(),
            info_fields: OnceLock::new(),
        })
    }

    /// The `INFO` column as a key/value map, parsed on first access.
    ///
    /// Each `;`-separated item contributes its key and the first
    /// comma-separated value; bare flags map to `"true"`.
    pub fn info_fields(&self) -> &HashMap<String, String> {
        self.info_fields.get_or_init(|| parse_info(&self.info))
    }
}

fn parse_info(info: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for item in info.split(';') {
        if item.is_empty() {
            continue;
        }
        match item.split_once('=') {
            Some((key, value)) => {
                let first = value.split(',').next().unwrap_or_default();
                fields.insert(key.to_string(), first.to_string());
            }
            None => {
                fields.insert(item.to_string(), "true".to_string());
            }
        }
    }
    fields
}
