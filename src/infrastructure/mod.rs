pub mod persistence;
pub mod workers;
