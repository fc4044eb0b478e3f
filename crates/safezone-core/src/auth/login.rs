use serde::Serialize;

use super::{AuthProvider, AuthResult};
use crate::alert::UserAlert;
use crate::store::ProfileDirectory;

/// Result of a login attempt, ready to present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoginOutcome {
    /// Signed in and the `users/{uid}` profile exists.
    Welcome { name: String },
    /// Credentials were valid but no profile exists; the session was dropped.
    AccountNotFound,
    /// Signed in through Google; no profile check is made.
    SignedIn,
    Failed { title: String, message: String },
}

impl LoginOutcome {
    fn failed(title: &str, message: impl std::fmt::Display) -> Self {
        Self::Failed {
            title: title.to_string(),
            message: message.to_string(),
        }
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::Welcome { .. } | Self::SignedIn)
    }

    /// Alert shown for this outcome, if any.
    #[must_use]
    pub fn alert(&self) -> Option<UserAlert> {
        match self {
            Self::Welcome { name } => Some(UserAlert::new(
                "Login Successful",
                format!("Welcome back, {name}!"),
            )),
            Self::AccountNotFound => Some(UserAlert::new(
                "Account Not Found",
                "No account exists for this user. Please sign up.",
            )),
            Self::SignedIn => None,
            Self::Failed { title, message } => Some(UserAlert::new(title, message)),
        }
    }
}

/// Email/password login followed by the profile check.
pub async fn login_with_password<A, D>(
    auth: &A,
    directory: &D,
    email: &str,
    password: &str,
) -> LoginOutcome
where
    A: AuthProvider + ?Sized,
    D: ProfileDirectory + ?Sized,
{
    let session = match auth.sign_in_with_password(email, password).await {
        Ok(session) => session,
        Err(error) => {
            tracing::warn!("Login failed: {}", error);
            return LoginOutcome::failed("Login Failed", error);
        }
    };

    match directory
        .fetch_profile(&session.user.uid, Some(&session.id_token))
        .await
    {
        Ok(Some(profile)) => {
            tracing::info!("Signed in as {}", session.user.uid);
            LoginOutcome::Welcome {
                name: profile.display_name(),
            }
        }
        Ok(None) => {
            tracing::info!("No profile for {}, signing out", session.user.uid);
            if let Err(error) = auth.sign_out().await {
                tracing::warn!("Failed to clear session: {}", error);
            }
            LoginOutcome::AccountNotFound
        }
        Err(error) => {
            tracing::warn!("Profile lookup failed for {}: {}", session.user.uid, error);
            LoginOutcome::failed("Login Failed", error)
        }
    }
}

/// Google ID-token login.
pub async fn login_with_google<A>(auth: &A, id_token: &str) -> LoginOutcome
where
    A: AuthProvider + ?Sized,
{
    match auth.sign_in_with_google(id_token).await {
        Ok(session) => {
            tracing::info!("Signed in with Google as {}", session.user.uid);
            LoginOutcome::SignedIn
        }
        Err(error) => {
            tracing::warn!("Google login failed: {}", error);
            LoginOutcome::failed("Google Login Failed", error)
        }
    }
}

pub async fn logout<A>(auth: &A) -> AuthResult<()>
where
    A: AuthProvider + ?Sized,
{
    auth.sign_out().await?;
    tracing::info!("Signed out");
    Ok(())
}
