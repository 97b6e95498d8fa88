pub mod config;
pub mod inception;
pub mod scorer;
