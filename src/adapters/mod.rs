pub mod database;
pub mod identity;
