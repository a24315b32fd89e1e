pub mod grading;
pub mod json;
pub mod parser;
pub mod schema;
pub mod table;
