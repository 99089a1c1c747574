pub mod auth;
pub mod json;
pub mod query;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use json::ApiJson;
pub use query::ApiQuery;
pub use response::{ApiResponse, ApiResult};
