//! Authentication state machine
//!
//! Pure transitions only; `SsoClient` drives it and publishes every new
//! state through a watch channel.

use crate::error::ClientError;
use crate::session::ClientSession;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    /// Redirect to the auth server in flight.
    LoggingIn,
    /// Callback received, code exchange running.
    Exchanging,
    Authenticated(ClientSession),
    Refreshing(ClientSession),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoginStarted,
    CallbackReceived,
    /// Tokens obtained from an exchange, or a stored session restored.
    SessionEstablished(ClientSession),
    RefreshStarted,
    Refreshed(ClientSession),
    SessionExpired,
    LoggedOut,
    Failed(String),
}

impl AuthState {
    pub fn transition(self, event: AuthEvent) -> Result<AuthState, ClientError> {
        use AuthEvent as E;
        use AuthState as S;

        match (self, event) {
            (_, E::LoggedOut) => Ok(S::Unauthenticated),
            (_, E::Failed(reason)) => Ok(S::Error(reason)),

            (S::Unauthenticated | S::Error(_), E::LoginStarted) => Ok(S::LoggingIn),
            (S::Unauthenticated | S::LoggingIn | S::Error(_), E::CallbackReceived) => {
                Ok(S::Exchanging)
            }
            (
                S::Unauthenticated | S::Exchanging | S::Authenticated(_) | S::Error(_),
                E::SessionEstablished(session),
            ) => Ok(S::Authenticated(session)),

            (S::Authenticated(session), E::RefreshStarted) => Ok(S::Refreshing(session)),
            // a stored session restored after its access token lapsed is
            // refreshed without passing through `Authenticated`
            (S::Refreshing(_) | S::Unauthenticated | S::Error(_), E::Refreshed(session)) => {
                Ok(S::Authenticated(session))
            }

            (S::Authenticated(_) | S::Refreshing(_), E::SessionExpired) => Ok(S::Unauthenticated),

            (from, event) => Err(ClientError::InvalidTransition {
                from: from.name().to_string(),
                event: format!("{:?}", event),
            }),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_) | AuthState::Refreshing(_))
    }

    pub fn session(&self) -> Option<&ClientSession> {
        match self {
            AuthState::Authenticated(s) | AuthState::Refreshing(s) => Some(s),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::LoggingIn => "logging_in",
            AuthState::Exchanging => "exchanging",
            AuthState::Authenticated(_) => "authenticated",
            AuthState::Refreshing(_) => "refreshing",
            AuthState::Error(_) => "error",
        }
    }
}
