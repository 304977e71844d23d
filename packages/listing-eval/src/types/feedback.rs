//! User feedback on previously surfaced listings.

use serde::{Deserialize, Serialize};

/// A like/dislike vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Yes,
    No,
}

impl Vote {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

impl std::fmt::Display for Vote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One past judgement, joined with the listing it was about.
///
/// `categories` and `room_scores` are kept as the raw JSON stored alongside
/// the feedback; rendering tolerates either being malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackExample {
    pub vote: Vote,
    pub categories: Option<String>,
    pub reason: Option<String>,
    pub room_scores: Option<String>,
    pub address: Option<String>,
}

impl FeedbackExample {
    pub fn new(vote: Vote) -> Self {
        Self {
            vote,
            categories: None,
            reason: None,
            room_scores: None,
            address: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_categories(mut self, categories: impl Into<String>) -> Self {
        self.categories = Some(categories.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_room_scores(mut self, room_scores: impl Into<String>) -> Self {
        self.room_scores = Some(room_scores.into());
        self
    }

    /// Category labels; malformed JSON yields none.
    pub fn category_list(&self) -> Vec<String> {
        self.categories
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_parse() {
        assert_eq!(Vote::parse("yes"), Some(Vote::Yes));
        assert_eq!(Vote::parse(" NO "), Some(Vote::No));
        assert_eq!(Vote::parse("maybe"), None);
    }

    #[test]
    fn test_category_list_tolerates_bad_json() {
        let ok = FeedbackExample::new(Vote::No).with_categories(r#"["Too dark", "Bad view"]"#);
        assert_eq!(ok.category_list(), vec!["Too dark", "Bad view"]);

        let bad = FeedbackExample::new(Vote::No).with_categories("Too dark");
        assert!(bad.category_list().is_empty());

        assert!(FeedbackExample::new(Vote::Yes).category_list().is_empty());
    }
}
