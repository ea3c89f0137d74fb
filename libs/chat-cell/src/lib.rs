pub mod handlers;
pub mod intent;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::*;
