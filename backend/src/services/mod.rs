pub mod backend_client;
pub mod list_cache;
pub mod media_service;
pub mod proxy_service;
pub mod session_service;
pub mod verification_service;

pub use backend_client::{BackendClient, ProxyBody, ProxyResponse};
pub use list_cache::ListCache;
pub use media_service::MediaService;
pub use proxy_service::ProxyService;
pub use session_service::SessionService;
pub use verification_service::VerificationService;
