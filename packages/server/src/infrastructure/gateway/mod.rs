//! IdentityGateway implementations.

pub mod hmac;

pub use hmac::HmacMediaGateway;
