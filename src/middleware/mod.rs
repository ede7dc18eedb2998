//! Tower and tonic middleware.
//!
//! Layer order for a gateway (outermost first): request logging, cookie
//! translation, then the auth interceptor on the gRPC service itself.

pub mod cookie;
pub mod interceptor;
pub mod logging;

pub use cookie::{CookieAuthLayer, CookieAuthService};
pub use interceptor::AuthInterceptor;
pub use logging::{RequestLogLayer, RequestLogService};
