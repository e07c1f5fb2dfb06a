pub mod csv_parser;
pub mod import_service;
