//! Database entities

pub mod session;
pub mod user;

pub use session::Entity as Session;
pub use user::Entity as User;

pub mod prelude {
    pub use super::session::Entity as Session;
    pub use super::user::Entity as User;
}
