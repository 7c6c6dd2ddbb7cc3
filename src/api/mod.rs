mod analytics;
mod contact;
mod handlers;
mod routes;
mod session;

pub use handlers::{AppState, SuccessResponse};
pub use routes::create_api_router;
