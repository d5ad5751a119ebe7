pub mod config;
pub mod generator;
pub mod plot;
pub mod table;
