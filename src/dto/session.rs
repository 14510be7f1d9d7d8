use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    api::{auth::Credentials, models::EntrantId},
    state::UserSession,
};

/// Identity and tokens handed over by the login flow.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_has_token"))]
pub struct SignInRequest {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Token issued by the backend's own login.
    #[serde(default)]
    pub session_token: Option<String>,
    /// Token issued by the federated identity provider.
    #[serde(default)]
    pub federated_token: Option<String>,
}

fn validate_has_token(request: &SignInRequest) -> Result<(), ValidationError> {
    let usable = [&request.session_token, &request.federated_token]
        .into_iter()
        .flatten()
        .any(|token| !token.trim().is_empty());
    if usable {
        return Ok(());
    }

    let mut err = ValidationError::new("missing_token");
    err.message = Some("at least one of session_token or federated_token is required".into());
    Err(err)
}

impl SignInRequest {
    pub fn into_parts(self) -> (UserSession, Credentials) {
        let display_name = self
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        (
            UserSession {
                user_id: EntrantId::new(self.user_id.trim()),
                display_name,
            },
            Credentials {
                session_token: self.session_token,
                federated_token: self.federated_token,
            },
        )
    }
}

/// Current session as seen by the local surface.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<EntrantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl SessionView {
    pub fn signed_out() -> Self {
        Self {
            signed_in: false,
            user_id: None,
            display_name: None,
        }
    }
}

impl From<UserSession> for SessionView {
    fn from(value: UserSession) -> Self {
        Self {
            signed_in: true,
            user_id: Some(value.user_id),
            display_name: value.display_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(session: Option<&str>, federated: Option<&str>) -> SignInRequest {
        SignInRequest {
            user_id: "42".into(),
            display_name: Some("  ".into()),
            session_token: session.map(Into::into),
            federated_token: federated.map(Into::into),
        }
    }

    #[test]
    fn sign_in_needs_a_usable_token() {
        assert!(request(Some("abc"), None).validate().is_ok());
        assert!(request(None, Some("xyz")).validate().is_ok());
        assert!(request(Some("  "), None).validate().is_err());
        assert!(request(None, None).validate().is_err());
    }

    #[test]
    fn blank_display_name_is_dropped() {
        let (user, credentials) = request(Some("abc"), None).into_parts();
        assert_eq!(user.user_id, EntrantId::new("42"));
        assert_eq!(user.display_name, None);
        assert_eq!(credentials.session_token.as_deref(), Some("abc"));
    }
}
