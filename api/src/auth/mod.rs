//! Request authentication

pub mod bearer;

pub use bearer::auth_middleware;
