pub mod analysis_store;
pub mod csv_parser;
pub mod validator;
