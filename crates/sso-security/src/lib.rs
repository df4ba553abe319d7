//! # SSO Security
//!
//! Security utilities: authorization codes, the `user_id` cookie,
//! relying-party origin policy and redirect URI checks.

pub mod code;
pub mod cookie;
pub mod origin;
pub mod redirect;

pub use code::{code_fingerprint, generate_auth_code};
pub use origin::OriginPolicy;
pub use redirect::{is_same_origin, parse_absolute_url, RedirectError};
