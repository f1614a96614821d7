pub mod admin;
pub mod auth;
pub mod hospitals;
pub mod reservations;
pub mod users;
