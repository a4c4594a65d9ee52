use serde::{Deserialize, Serialize};

use crate::domain::{Credentials, Session};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl From<&Credentials> for LoginRequest {
    fn from(credentials: &Credentials) -> Self {
        Self {
            email: credentials.identifier.clone(),
            password: credentials.secret.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub session: Session,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionValidationResponse {
    pub valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_is_built_from_credentials() {
        let credentials = Credentials {
            identifier: "admin@clinic.test".to_string(),
            secret: "s3cret".to_string(),
        };

        let body = serde_json::to_value(LoginRequest::from(&credentials)).expect("serialize");

        assert_eq!(
            body,
            serde_json::json!({ "email": "admin@clinic.test", "password": "s3cret" })
        );
    }
}
