use crate::api::schemas::users::{UserResponse, validate_email, validate_password};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signup {
    pub email: String,
    pub password: String,
}

impl Signup {
    /// # Errors
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

impl Login {
    /// # Errors
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err("Password is required".to_string());
        }
        Ok(())
    }
}

/// Payload for endpoints that only take an address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

impl EmailRequest {
    /// # Errors
    /// Returns a message if the address is malformed.
    pub fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
    pub email: Option<String>,
}

impl VerifyEmailQuery {
    /// Both parameters, when both are present and non-empty.
    pub fn otp(&self) -> Option<(&str, &str)> {
        let email = self.email.as_deref().filter(|s| !s.is_empty())?;
        let token = self.token.as_deref().filter(|s| !s.is_empty())?;
        Some((email, token))
    }
}

/// Tokens the verification page lifts from the confirmation link fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyHash {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_validation() {
        let login = Login { email: "a@example.com".into(), password: String::new() };
        assert_eq!(login.validate().unwrap_err(), "Password is required");

        // Login does not enforce the signup length rule.
        let login = Login { email: "a@example.com".into(), password: "x".into() };
        assert!(login.validate().is_ok());
    }

    #[test]
    fn test_verify_email_query_requires_both() {
        let q = VerifyEmailQuery { token: Some("123456".into()), email: None };
        assert!(q.otp().is_none());

        let q = VerifyEmailQuery { token: Some("123456".into()), email: Some(String::new()) };
        assert!(q.otp().is_none());

        let q = VerifyEmailQuery { token: Some("123456".into()), email: Some("a@example.com".into()) };
        assert_eq!(q.otp(), Some(("a@example.com", "123456")));
    }

    #[test]
    fn test_verify_hash_optional_fields() {
        let req: VerifyHash = serde_json::from_str(r#"{"access_token":"at"}"#).unwrap();
        assert_eq!(req.access_token, "at");
        assert!(req.refresh_token.is_none());
    }
}
