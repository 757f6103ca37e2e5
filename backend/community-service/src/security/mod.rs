pub mod jwt;
pub mod password;
pub mod webhook;

pub use jwt::{Claims, JwtKeys};
pub use password::{hash_password, verify_password};
