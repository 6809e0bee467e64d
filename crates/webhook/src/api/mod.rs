pub mod errors;
pub mod handlers;
pub mod server;

pub use errors::ApiError;
pub use server::ApiServer;
