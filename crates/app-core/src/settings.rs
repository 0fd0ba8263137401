//! App preferences

use i18n::Language;
use storage::{keys, read_json, write_json, LocalStore};

use crate::error::Result;

/// Saved UI language, Indonesian when nothing usable is stored
pub async fn load_language(store: &dyn LocalStore) -> Language {
    match read_json::<Language>(store, keys::LANGUAGE).await {
        Ok(language) => language.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "language preference unreadable, using default");
            Language::default()
        }
    }
}

/// Persist the UI language
pub async fn save_language(store: &dyn LocalStore, language: Language) -> Result<()> {
    write_json(store, keys::LANGUAGE, &language).await?;
    tracing::info!(language = language.tag(), "language changed");
    Ok(())
}
