use crate::domain::user::User;

/// A freshly minted session token together with the account it belongs to.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}
