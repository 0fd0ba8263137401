//! Supported languages and negotiation

use fluent_langneg::{convert_vec_str_to_langids_lossy, negotiate_languages, NegotiationStrategy};
use serde::{Deserialize, Serialize};
use unic_langid::{langid, LanguageIdentifier};

/// A language the app ships a catalog for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// Bahasa Indonesia
    #[default]
    #[serde(rename = "id")]
    Indonesian,
    /// English
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// All supported languages, default first
    pub const ALL: [Language; 2] = [Language::Indonesian, Language::English];

    /// BCP-47 tag
    pub fn tag(self) -> &'static str {
        match self {
            Language::Indonesian => "id",
            Language::English => "en",
        }
    }

    /// Name of the language in itself
    pub fn native_name(self) -> &'static str {
        match self {
            Language::Indonesian => "Bahasa Indonesia",
            Language::English => "English",
        }
    }

    /// Unicode language identifier
    pub fn langid(self) -> LanguageIdentifier {
        match self {
            Language::Indonesian => langid!("id"),
            Language::English => langid!("en"),
        }
    }

    /// Look up a language by tag, ignoring region and case (`en-US` → English)
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.split(['-', '_']).next()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|language| language.tag() == primary)
    }
}

/// Pick the best supported language for the requested tags
///
/// Unparseable tags are skipped; with no match the default is returned.
pub fn negotiate(requested: &[&str]) -> Language {
    let requested = convert_vec_str_to_langids_lossy(requested);
    let available: Vec<LanguageIdentifier> = Language::ALL.iter().map(|l| l.langid()).collect();
    let default = Language::default().langid();

    let supported = negotiate_languages(
        &requested,
        &available,
        Some(&default),
        NegotiationStrategy::Filtering,
    );

    supported
        .first()
        .and_then(|langid| Language::from_tag(langid.language.as_str()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_indonesian() {
        assert_eq!(Language::default(), Language::Indonesian);
        assert_eq!(Language::default().tag(), "id");
    }

    #[test]
    fn test_from_tag() {
        assert_eq!(Language::from_tag("en-US"), Some(Language::English));
        assert_eq!(Language::from_tag("ID"), Some(Language::Indonesian));
        assert_eq!(Language::from_tag("fr"), None);
    }

    #[test]
    fn test_negotiate() {
        assert_eq!(negotiate(&["en-GB", "id"]), Language::English);
        assert_eq!(negotiate(&["id-ID"]), Language::Indonesian);
        assert_eq!(negotiate(&["fr-FR", "de"]), Language::Indonesian);
        assert_eq!(negotiate(&[]), Language::Indonesian);
    }

    #[test]
    fn test_serde_uses_tags() {
        let json = serde_json::to_string(&Language::English).unwrap();
        assert_eq!(json, "\"en\"");

        let parsed: Language = serde_json::from_str("\"id\"").unwrap();
        assert_eq!(parsed, Language::Indonesian);
    }
}
