pub mod booking;
pub mod conflict;
pub mod locking;
pub mod slots;
