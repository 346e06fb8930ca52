pub mod candidate;
pub mod summary;
pub mod transcript;
