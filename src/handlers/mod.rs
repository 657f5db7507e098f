pub mod auth;
pub mod catalog;
pub mod clients;
pub mod employees;
pub mod reports;
pub mod requests;
