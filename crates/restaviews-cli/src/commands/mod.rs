pub mod common;
pub mod favorite;
pub mod restaurants;
pub mod reviews;
pub mod sync;
