pub mod composite;
pub mod evaluation;
