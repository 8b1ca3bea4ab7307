pub mod catalogs;
pub mod transports;
