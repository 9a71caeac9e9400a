use std::collections::HashMap;

use super::Locale;
use super::MessageKey;

const EN: &str = include_str!("../../../locales/en.toml");
const VI: &str = include_str!("../../../locales/vi.toml");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to parse {locale} catalog: {source}")]
    Parse {
        locale: Locale,
        #[source]
        source: toml::de::Error,
    },

    #[error("Entry {key} in {locale} catalog is not a string")]
    NotAString { locale: Locale, key: String },
}

/// Immutable message catalogs for every supported locale.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    bundles: HashMap<Locale, HashMap<String, String>>,
}

impl Catalog {
    /// Parse the catalogs compiled into the binary.
    ///
    /// # Errors
    /// * `CatalogError` - A bundled file is not a flat table of strings
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_sources(&[(Locale::En, EN), (Locale::Vi, VI)])
    }

    /// Build a catalog from `(locale, toml source)` pairs.
    ///
    /// Each source is a flat table mapping message keys to texts.
    pub fn from_sources(sources: &[(Locale, &str)]) -> Result<Self, CatalogError> {
        let mut bundles = HashMap::with_capacity(sources.len());

        for (locale, source) in sources {
            let table: toml::Table = source.parse().map_err(|source| CatalogError::Parse {
                locale: *locale,
                source,
            })?;

            let mut messages = HashMap::with_capacity(table.len());
            for (key, value) in table {
                let toml::Value::String(text) = value else {
                    return Err(CatalogError::NotAString {
                        locale: *locale,
                        key,
                    });
                };
                messages.insert(key, text);
            }

            tracing::debug!(locale = %locale, messages = messages.len(), "Loaded message catalog");
            bundles.insert(*locale, messages);
        }

        Ok(Self { bundles })
    }

    /// Text for `key` in `locale`, without template data.
    pub fn message(&self, locale: Locale, key: MessageKey) -> String {
        self.resolve(locale, key, &[])
    }

    /// Resolve `key` for `locale`, falling back to English and then to the
    /// key's built-in text. `{{name}}` placeholders are filled from `data`.
    pub fn resolve(&self, locale: Locale, key: MessageKey, data: &[(&str, &str)]) -> String {
        let template = self
            .lookup(locale, key)
            .or_else(|| self.lookup(Locale::En, key))
            .unwrap_or_else(|| key.default_text());

        data.iter()
            .fold(template.to_string(), |text, (name, value)| {
                text.replace(&format!("{{{{{name}}}}}"), value)
            })
    }

    fn lookup(&self, locale: Locale, key: MessageKey) -> Option<&str> {
        self.bundles
            .get(&locale)
            .and_then(|messages| messages.get(key.as_str()))
            .map(String::as_str)
    }
}
