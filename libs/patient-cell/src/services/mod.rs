pub mod labs;
pub mod patient;
pub mod reports;
