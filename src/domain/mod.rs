pub mod auth;
pub mod auth_session;
pub mod identity;
pub mod user;

pub use auth::Claims;
pub use auth_session::AuthSession;
pub use identity::{OtpKind, ProviderSession, ProviderUser};
pub use user::{NewUser, User, UserUpdate};
