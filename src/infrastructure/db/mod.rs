pub mod connection;
pub mod lists;
pub mod scans;
pub mod validations;
