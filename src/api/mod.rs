pub mod handlers;
pub mod query;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
