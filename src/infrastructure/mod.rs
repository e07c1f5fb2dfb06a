pub mod database;
pub mod staging;
