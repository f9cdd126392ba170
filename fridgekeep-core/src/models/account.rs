use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the account signs in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
    #[default]
    Email,
    Kakao,
    Google,
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialType::Email => write!(f, "email"),
            CredentialType::Kakao => write!(f, "kakao"),
            CredentialType::Google => write!(f, "google"),
        }
    }
}

/// A registered user.
///
/// `password` holds an Argon2 PHC hash string, never the plain password.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub user_id: String,
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub credential_type: CredentialType,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAccount")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("nickname", &self.nickname)
            .field("profile_image", &self.profile_image)
            .field("credential_type", &self.credential_type)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl fmt::Display for UserAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} <{}>", self.nickname, self.email)?;
        writeln!(f, "User ID: {}", self.user_id)?;
        writeln!(f, "Sign-in: {}", self.credential_type)?;
        if let Some(image) = &self.profile_image {
            writeln!(f, "Profile image: {}", image)?;
        }
        write!(f, "Member since: {}", self.created_at.format("%Y-%m-%d"))
    }
}

/// Registration input.
#[derive(Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub credential_type: CredentialType,
}

impl NewAccount {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        nickname: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            nickname: nickname.into(),
            profile_image: None,
            credential_type: CredentialType::Email,
        }
    }

    pub fn with_profile_image(mut self, image: impl Into<String>) -> Self {
        self.profile_image = Some(image.into());
        self
    }

    pub fn with_credential_type(mut self, credential_type: CredentialType) -> Self {
        self.credential_type = credential_type;
        self
    }
}

/// Partial profile edit. Email is deliberately absent: it can't change after
/// registration.
#[derive(Clone, Default)]
pub struct ProfileUpdate {
    pub nickname: Option<String>,
    pub profile_image: Option<String>,
    pub password: Option<String>,
}

impl ProfileUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn profile_image(mut self, image: impl Into<String>) -> Self {
        self.profile_image = Some(image.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nickname.is_none() && self.profile_image.is_none() && self.password.is_none()
    }
}
