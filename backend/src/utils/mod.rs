pub mod cookies;
pub mod error;
pub mod i18n;

pub use cookies::{ContextKind, OneTimeContext};
pub use error::{ApiError, ApiResult};
pub use i18n::{Locale, TextDirection, get_locale, locale_from_accept_language, with_locale};
