pub mod broadcast;
pub mod identity;
pub mod lifecycle;
pub mod numbering;
pub mod registration;
pub mod snapshot;
