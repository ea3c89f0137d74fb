pub mod envelope;
pub mod error;
pub mod extract;
pub mod time;
