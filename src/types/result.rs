//! Search result types

use serde::{Deserialize, Serialize};

use super::ModelRecord;

/// Record field that satisfied the text predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchField {
    Name,
    Title,
    Curators,
    PublicationAuthors,
    Synopsis,
}

impl MatchField {
    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchField::Name => "name",
            MatchField::Title => "title",
            MatchField::Curators => "curators",
            MatchField::PublicationAuthors => "publicationAuthors",
            MatchField::Synopsis => "synopsis",
        }
    }

    /// Points contributed by one match in this field.
    pub fn weight(&self) -> u32 {
        match self {
            MatchField::Title => 3,
            MatchField::Curators | MatchField::PublicationAuthors => 2,
            MatchField::Synopsis => 1,
            MatchField::Name => 0,
        }
    }
}

/// One field match and the matched text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub field: MatchField,
    pub snippet: String,
}

/// A scored search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    /// Higher is more relevant.
    pub score: u32,
    /// Every field that matched, in scoring order.
    pub matches: Vec<Match>,
    pub metadata: ModelRecord,
}
