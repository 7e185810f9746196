//! The `labels.json` output document.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use strand_compose::Tag;

use crate::error::DatasetResult;

/// One sample's label: either the aggregated build tags, or a class plus
/// tags in classification mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelEntry {
    Classed { class: usize, tags: Vec<Tag> },
    Tags(Vec<Tag>),
}

/// Sample id to label. Written once, after every worker has finished.
pub type LabelMap = BTreeMap<String, LabelEntry>;

/// Serialize the label map into `directory/labels.json`.
pub fn write_labels(directory: &Path, labels: &LabelMap) -> DatasetResult<()> {
    let document = serde_json::to_string(labels)?;
    fs::write(directory.join("labels.json"), document)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_both_label_shapes() {
        let mut labels = LabelMap::new();
        labels.insert(
            "aaaa".to_string(),
            LabelEntry::Tags(vec![("family".to_string(), "example".to_string())]),
        );
        labels.insert(
            "bbbb".to_string(),
            LabelEntry::Classed {
                class: 1,
                tags: vec![("family".to_string(), "example".to_string())],
            },
        );

        let dir = tempfile::tempdir().unwrap();
        write_labels(dir.path(), &labels).unwrap();

        let text = fs::read_to_string(dir.path().join("labels.json")).unwrap();
        let parsed: LabelMap = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, labels);
    }
}
