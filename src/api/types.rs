use serde::{Deserialize, Deserializer};

/// One row of the review table, as served by the table data endpoint.
///
/// Readiness flags arrive in several historical shapes (bool, epoch seconds,
/// or null); they are normalized to booleans on deserialization. `checksum`
/// is only meaningful once `indexed` is true.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewRecord {
    pub id: i64,
    #[serde(default)]
    pub external_link: String,
    #[serde(default)]
    pub priority: i64,
    /// Package name
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_epoch: i64,
    /// Display-formatted sibling of created_epoch
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub products: Option<String>,
    #[serde(default)]
    pub checksum: Option<String>,

    // Readiness flags — monotonic within one display: indexed implies
    // unpacked implies imported.
    #[serde(default, alias = "imported_epoch", deserialize_with = "de_flag")]
    pub imported: bool,
    #[serde(default, alias = "unpacked_epoch", deserialize_with = "de_flag")]
    pub unpacked: bool,
    #[serde(default, alias = "indexed_epoch", deserialize_with = "de_flag")]
    pub indexed: bool,

    // Job counts, used only to decorate the report status
    #[serde(default)]
    pub active_jobs: u32,
    #[serde(default)]
    pub failed_jobs: u32,
    #[serde(default)]
    pub unresolved_matches: u32,
}

/// Accept `true`/`false`, an epoch number, or `null` for a readiness flag.
fn de_flag<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    let value = serde_json::Value::deserialize(de)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_accepts_bools() {
        let r: ReviewRecord =
            serde_json::from_str(r#"{"id": 1, "imported": true, "unpacked": false}"#).unwrap();
        assert!(r.imported);
        assert!(!r.unpacked);
        assert!(!r.indexed);
    }

    #[test]
    fn readiness_accepts_epochs_and_null() {
        let r: ReviewRecord = serde_json::from_str(
            r#"{"id": 2, "imported_epoch": 1700000000, "unpacked_epoch": null}"#,
        )
        .unwrap();
        assert!(r.imported);
        assert!(!r.unpacked);
    }

    #[test]
    fn missing_fields_default() {
        let r: ReviewRecord = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert_eq!(r.priority, 0);
        assert_eq!(r.checksum, None);
        assert_eq!(r.unresolved_matches, 0);
    }
}
