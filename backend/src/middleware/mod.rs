pub mod auth;
pub mod locale;
pub mod one_time_token;

pub use auth::dashboard_guard;
pub use locale::locale_middleware;
pub use one_time_token::one_time_token_middleware;
