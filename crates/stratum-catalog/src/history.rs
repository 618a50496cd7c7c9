use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stratum_types::ContentHash;

use crate::error::FormatResult;

/// A named snapshot of the namespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    /// Root catalog the tag points at.
    pub root_hash: ContentHash,
    pub revision: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}

/// Tag database, published as a content object with the `H` suffix.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    tags: Vec<Tag>,
}

impl History {
    pub fn new(tags: Vec<Tag>) -> Self {
        Self { tags }
    }

    pub fn parse(data: &[u8]) -> FormatResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn encode(&self) -> FormatResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn find_tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// The tag with the highest revision.
    pub fn latest(&self) -> Option<&Tag> {
        self.tags.iter().max_by_key(|t| t.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tag(name: &str, revision: u64) -> Tag {
        Tag {
            name: name.into(),
            root_hash: ContentHash::of(name.as_bytes()),
            revision,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            description: String::new(),
        }
    }

    #[test]
    fn parse_encoded() {
        let history = History::new(vec![tag("v1", 3), tag("trunk", 9), tag("v0", 1)]);
        let parsed = History::parse(&history.encode().unwrap()).unwrap();
        assert_eq!(parsed, history);
        assert_eq!(parsed.tags().len(), 3);
    }

    #[test]
    fn lookup() {
        let history = History::new(vec![tag("v1", 3), tag("trunk", 9)]);
        assert_eq!(history.find_tag("v1").unwrap().revision, 3);
        assert!(history.find_tag("v2").is_none());
        assert_eq!(history.latest().unwrap().name, "trunk");
        assert!(History::default().latest().is_none());
    }

    #[test]
    fn description_is_optional() {
        let json = format!(
            r#"{{"tags":[{{"name":"v1","root_hash":"{}","revision":1,"timestamp":"2024-01-01T00:00:00Z"}}]}}"#,
            ContentHash::of(b"v1")
        );
        let history = History::parse(json.as_bytes()).unwrap();
        assert_eq!(history.find_tag("v1").unwrap().description, "");
    }
}
