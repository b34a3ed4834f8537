pub mod duplicate;
pub mod error;
pub mod identifier;
pub mod scan;
pub mod scan_list;
