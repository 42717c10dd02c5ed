//! Internationalization utilities for the gateway
//!
//! Supported locales, locale parsing from path prefixes and
//! `Accept-Language` values, and the task-local locale of the request
//! currently being served.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

tokio::task_local! {
    static CURRENT_LOCALE: Locale;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Ar];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ar => "ar",
        }
    }

    pub const fn dir(self) -> TextDirection {
        match self {
            Self::En => TextDirection::Ltr,
            Self::Ar => TextDirection::Rtl,
        }
    }

    /// Exact match against a supported locale code ("en", "ar").
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == code)
    }

    /// Lenient match of a language tag.
    /// Accepts: "ar", "ar-EG", "ar_SA", "EN-us", ...
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_lowercase();
        let primary = tag.split(['-', '_', ';']).next()?;
        Self::from_code(primary.trim())
    }

    /// Split a request path into its locale prefix and the remainder.
    ///
    /// `/ar/courses` -> `(Ar, "/courses")`, `/en` -> `(En, "")`.
    /// `/english` is not a prefix.
    pub fn split_prefix(path: &str) -> Option<(Self, &str)> {
        let trimmed = path.strip_prefix('/')?;
        let (segment, rest) = match trimmed.find('/') {
            Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
            None => (trimmed, ""),
        };
        Self::from_code(segment).map(|locale| (locale, rest))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TextDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

/// Pick the first supported locale from an Accept-Language header value,
/// honoring q-weights.
pub fn locale_from_accept_language(header_value: &str) -> Option<Locale> {
    let mut candidates: Vec<(f32, Locale)> = header_value
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let locale = Locale::from_tag(parts.next()?)?;
            let weight = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            // q=0 marks the language as not acceptable
            (weight > 0.0).then_some((weight, locale))
        })
        .collect();

    // stable sort keeps header order for equal weights
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    candidates.first().map(|(_, locale)| *locale)
}

/// Run `fut` with `locale` as the current request locale.
pub async fn with_locale<F: Future>(locale: Locale, fut: F) -> F::Output {
    CURRENT_LOCALE.scope(locale, fut).await
}

/// Locale of the request being served, or the default outside a request scope.
pub fn get_locale() -> Locale {
    CURRENT_LOCALE.try_with(|l| *l).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(Locale::from_tag("ar"), Some(Locale::Ar));
        assert_eq!(Locale::from_tag("ar-EG"), Some(Locale::Ar));
        assert_eq!(Locale::from_tag("AR_sa"), Some(Locale::Ar));
        assert_eq!(Locale::from_tag("en-US"), Some(Locale::En));
        assert_eq!(Locale::from_tag("fr"), None);
        assert_eq!(Locale::from_tag(""), None);
    }

    #[test]
    fn test_split_prefix() {
        assert_eq!(Locale::split_prefix("/ar/courses/12"), Some((Locale::Ar, "/courses/12")));
        assert_eq!(Locale::split_prefix("/en"), Some((Locale::En, "")));
        assert_eq!(Locale::split_prefix("/en/"), Some((Locale::En, "/")));
        assert_eq!(Locale::split_prefix("/english"), None);
        assert_eq!(Locale::split_prefix("/"), None);
        assert_eq!(Locale::split_prefix("courses"), None);
    }

    #[test]
    fn test_direction() {
        assert_eq!(Locale::Ar.dir().as_str(), "rtl");
        assert_eq!(Locale::En.dir().as_str(), "ltr");
    }

    #[test]
    fn test_accept_language() {
        assert_eq!(locale_from_accept_language("ar-EG,ar;q=0.9,en;q=0.8"), Some(Locale::Ar));
        assert_eq!(locale_from_accept_language("fr-FR, en;q=0.5, ar;q=0.7"), Some(Locale::Ar));
        assert_eq!(locale_from_accept_language("de, fr"), None);
        assert_eq!(locale_from_accept_language("en"), Some(Locale::En));
    }

    #[test]
    fn test_accept_language_zero_weight_excluded() {
        assert_eq!(locale_from_accept_language("ar;q=0"), None);
        assert_eq!(locale_from_accept_language("ar;q=0, en;q=0.1"), Some(Locale::En));
        assert_eq!(locale_from_accept_language("en;q=0.0, fr, ar;q=0.3"), Some(Locale::Ar));
    }

    #[tokio::test]
    async fn test_scoped_locale() {
        assert_eq!(get_locale(), Locale::En);
        let inside = with_locale(Locale::Ar, async { get_locale() }).await;
        assert_eq!(inside, Locale::Ar);
        assert_eq!(get_locale(), Locale::En);
    }
}
