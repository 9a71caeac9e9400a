use std::fmt;

/// Languages the service ships catalogs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    En,
    Vi,
}

impl Locale {
    pub const SUPPORTED: [Locale; 2] = [Locale::En, Locale::Vi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Vi => "vi",
        }
    }

    /// Match a BCP 47 tag on its primary language subtag (`vi-VN` -> `vi`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        Self::SUPPORTED
            .into_iter()
            .find(|locale| locale.as_str() == primary)
    }

    /// Pick the response language for a request.
    ///
    /// The `lang` query parameter wins over `Accept-Language`; within each
    /// source, tags are tried by descending quality. Falls back to English.
    pub fn negotiate(lang: Option<&str>, accept_language: Option<&str>) -> Self {
        [lang, accept_language]
            .into_iter()
            .flatten()
            .find_map(|source| {
                ranked_tags(source)
                    .into_iter()
                    .find_map(|tag| Self::from_tag(&tag))
            })
            .unwrap_or_default()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split an `Accept-Language` style list into tags ordered by quality.
fn ranked_tags(header: &str) -> Vec<String> {
    let mut tags: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let quality = parts
                .find_map(|param| param.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (quality > 0.0).then(|| (tag.to_string(), quality))
        })
        .collect();

    // Stable sort keeps header order among equal weights.
    tags.sort_by(|a, b| b.1.total_cmp(&a.1));
    tags.into_iter().map(|(tag, _)| tag).collect()
}
