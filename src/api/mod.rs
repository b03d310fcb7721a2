mod admin;
mod auth;
pub(crate) mod errors;
mod guards;
mod handlers;
mod helpers;
pub(crate) mod router;
mod student;
mod validation;
