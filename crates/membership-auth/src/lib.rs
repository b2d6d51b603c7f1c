//! Credentials, form validation and session cookie primitives for the membership site

pub mod cookie;
pub mod password;
pub mod seal;
pub mod validation;

pub use cookie::{CookieError, CookieSigner};
pub use password::{hash_password, verify_password, PasswordError};
pub use seal::{SealError, SessionSealer};
pub use validation::{Credentials, FormError, LoginForm, NewAccount, SignupForm};
