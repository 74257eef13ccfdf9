pub mod curve;
pub mod health;
pub mod status;
