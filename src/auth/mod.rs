//! Cookie sessions, passwords and the log-in, log-out and registration endpoints.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod register;
mod token;

pub(crate) use cookie::DEFAULT_COOKIE_DURATION;
pub use log_in::post_log_in;
pub use log_out::get_log_out;
pub use middleware::{admin_guard, auth_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::register_customer;
pub use token::Token;

pub(crate) use cookie::{invalidate_auth_cookie, set_auth_cookie};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

#[cfg(test)]
pub use middleware::AuthState;
