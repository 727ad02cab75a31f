//! On-disk artifact descriptor

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CacheError;

/// Artifact file format found next to the cache file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Json,
    Xml,
}

impl FileType {
    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Json => "json",
            FileType::Xml => "xml",
        }
    }
}

impl FromStr for FileType {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(FileType::Json),
            "xml" | "sbml" => Ok(FileType::Xml),
            other => Err(CacheError::InvalidQuery(format!(
                "unknown file type '{other}' (expected json or xml)"
            ))),
        }
    }
}

/// Location, size and modification time of a model's artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub model_id: String,
    pub path: PathBuf,
    pub file_type: FileType,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_parses_extensions() {
        assert_eq!("xml".parse::<FileType>().unwrap(), FileType::Xml);
        assert_eq!("SBML".parse::<FileType>().unwrap(), FileType::Xml);
        assert_eq!(" json ".parse::<FileType>().unwrap(), FileType::Json);
        assert!("omex".parse::<FileType>().is_err());
    }
}
