mod models;
mod state;
mod health;
mod routes;
pub mod files;

pub use models::AppState;
pub use health::health;
pub use files::serve_file;
pub use routes::routes;
