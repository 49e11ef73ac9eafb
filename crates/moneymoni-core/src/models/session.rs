use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// User type the backend reports for a household PIN login.
pub const HOUSEHOLD_USER_TYPE: &str = "household";

/// Authenticated session as reported by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub authenticated: bool,
    pub user_type: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from a login response when `/auth/me` could not be
    /// reached right after login.
    pub fn from_login(response: &LoginResponse, now: DateTime<Utc>) -> Self {
        Self {
            authenticated: true,
            user_type: HOUSEHOLD_USER_TYPE.to_string(),
            expires_at: now + Duration::seconds(response.expires_in),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.authenticated && !self.is_expired()
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }
}

/// `POST /auth/login` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_me_response() {
        let json = r#"{"user_type":"household","authenticated":true,"expires_at":4102444800}"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert!(session.authenticated);
        assert_eq!(session.user_type, "household");
        assert_eq!(session.expires_at.timestamp(), 4102444800);
        assert!(session.is_valid());
    }

    #[test]
    fn test_expired_session_is_not_valid() {
        let session = Session {
            authenticated: true,
            user_type: HOUSEHOLD_USER_TYPE.into(),
            expires_at: Utc::now() - Duration::minutes(1),
        };
        assert!(session.is_expired());
        assert!(!session.is_valid());
        assert_eq!(session.minutes_until_expiry(), 0);
    }

    #[test]
    fn test_from_login() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"access_token":"abc","token_type":"bearer","expires_in":1800}"#)
                .unwrap();
        let now = Utc::now();
        let session = Session::from_login(&response, now);
        assert!(session.authenticated);
        assert_eq!(session.expires_at - now, Duration::seconds(1800));
    }
}
