pub mod dispense;
pub mod forecast;
pub mod inventory;
