//! Fluent-backed message formatting
//!
//! Catalogs are embedded at compile time, one `.ftl` file per language.

use fluent::concurrent::FluentBundle;
use fluent::{FluentArgs, FluentResource};

use crate::lang::Language;

const CATALOG_ID: &str = include_str!("../locales/id/main.ftl");
const CATALOG_EN: &str = include_str!("../locales/en/main.ftl");

/// Formats messages of one language
pub struct Translator {
    language: Language,
    bundle: FluentBundle<FluentResource>,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator").field("language", &self.language).finish()
    }
}

impl Translator {
    /// Load the catalog for `language`
    pub fn new(language: Language) -> Self {
        let source = match language {
            Language::Indonesian => CATALOG_ID,
            Language::English => CATALOG_EN,
        };

        let resource = match FluentResource::try_new(source.to_string()) {
            Ok(resource) => resource,
            Err((resource, errors)) => {
                tracing::warn!(language = language.tag(), ?errors, "catalog has syntax errors");
                resource
            }
        };

        let mut bundle = FluentBundle::new_concurrent(vec![language.langid()]);
        bundle.set_use_isolating(false);
        if let Err(errors) = bundle.add_resource(resource) {
            tracing::warn!(language = language.tag(), ?errors, "catalog has conflicting messages");
        }

        Self { language, bundle }
    }

    /// Language of this translator
    pub fn language(&self) -> Language {
        self.language
    }

    /// Whether the catalog defines `id`
    pub fn has_message(&self, id: &str) -> bool {
        self.bundle.has_message(id)
    }

    /// Format a message without arguments
    pub fn translate(&self, id: &str) -> String {
        self.format(id, None)
    }

    /// Format a message with named arguments
    pub fn translate_with(&self, id: &str, args: &[(&str, &str)]) -> String {
        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, value.to_string());
        }
        self.format(id, Some(&fluent_args))
    }

    fn format(&self, id: &str, args: Option<&FluentArgs>) -> String {
        let Some(pattern) = self.bundle.get_message(id).and_then(|message| message.value()) else {
            tracing::warn!(language = self.language.tag(), id, "missing translation");
            return id.to_string();
        };

        let mut errors = vec![];
        let text = self.bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            tracing::warn!(id, ?errors, "message formatted with errors");
        }
        text.into_owned()
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_message() {
        let translator = Translator::new(Language::Indonesian);
        assert_eq!(translator.translate("error-event-full"), "Kuota acara sudah penuh.");

        let translator = Translator::new(Language::English);
        assert_eq!(translator.translate("error-event-full"), "This event is fully booked.");
    }

    #[test]
    fn test_message_with_arguments() {
        let translator = Translator::default();
        let text = translator.translate_with("error-required", &[("field", "NIK")]);
        assert_eq!(text, "NIK wajib diisi.");
    }

    #[test]
    fn test_missing_message_returns_id() {
        let translator = Translator::default();
        assert!(!translator.has_message("does-not-exist"));
        assert_eq!(translator.translate("does-not-exist"), "does-not-exist");
    }

    #[test]
    fn test_catalogs_define_the_same_messages() {
        let ids: Vec<&str> = CATALOG_ID
            .lines()
            .filter_map(|line| line.split_once(" = ").map(|(id, _)| id.trim()))
            .filter(|id| !id.starts_with('#') && !id.is_empty())
            .collect();
        assert!(!ids.is_empty());

        let english = Translator::new(Language::English);
        for id in ids {
            assert!(english.has_message(id), "English catalog lacks {id}");
        }
    }

    #[test]
    fn test_translator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Translator>();
    }
}
