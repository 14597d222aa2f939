pub mod activities;
pub mod events;
pub mod health;
pub mod insights;
pub mod leads;
pub mod users;
