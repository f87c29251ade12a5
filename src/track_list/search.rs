//! Linear track search.

use std::sync::Arc;

use crate::track::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Name,
    Title,
    Artist,
    Album,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchType {
    Equals,
    #[default]
    Contains,
    BeginsWith,
    EndsWith,
}

/// A search request. The query owns its matching rule and case policy.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub fields: Vec<SearchField>,
    pub match_type: MatchType,
    pub case_sensitive: bool,
}

impl SearchQuery {
    /// Case-insensitive substring search over every field.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fields: vec![
                SearchField::Name,
                SearchField::Title,
                SearchField::Artist,
                SearchField::Album,
            ],
            match_type: MatchType::Contains,
            case_sensitive: false,
        }
    }

    pub fn with_fields(mut self, fields: Vec<SearchField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_match_type(mut self, match_type: MatchType) -> Self {
        self.match_type = match_type;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn matches(&self, candidate: &str) -> bool {
        if self.case_sensitive {
            Self::apply(self.match_type, candidate, &self.text)
        } else {
            Self::apply(
                self.match_type,
                &candidate.to_lowercase(),
                &self.text.to_lowercase(),
            )
        }
    }

    fn apply(match_type: MatchType, candidate: &str, text: &str) -> bool {
        match match_type {
            MatchType::Equals => candidate == text,
            MatchType::Contains => candidate.contains(text),
            MatchType::BeginsWith => candidate.starts_with(text),
            MatchType::EndsWith => candidate.ends_with(text),
        }
    }

    /// First configured field of `track` that matches, with its value.
    pub fn first_match(&self, track: &Track) -> Option<(SearchField, String)> {
        self.fields.iter().find_map(|&field| {
            let value = match field {
                SearchField::Name => Some(track.file_name()),
                SearchField::Title => track.metadata().title.clone(),
                SearchField::Artist => track.metadata().artist.clone(),
                SearchField::Album => track.metadata().album.clone(),
            }?;
            self.matches(&value).then_some((field, value))
        })
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub index: usize,
    pub track: Arc<Track>,
    pub field: SearchField,
    pub matched_value: String,
}
