//! Auth error types and the fixed user-facing messages.

use comanda_core::EmailError;
use thiserror::Error;

use crate::directory::DirectoryError;

/// Error code reported by the identity provider.
///
/// Provider messages look like `"WEAK_PASSWORD : Password should be at
/// least 6 characters"`; the code is the part before the colon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    UserNotFound,
    WrongPassword,
    InvalidCredential,
    EmailExists,
    WeakPassword,
    InvalidEmail,
    UserDisabled,
    TooManyAttempts,
    OperationNotAllowed,
    ConfigurationNotFound,
    Other(String),
}

impl AuthErrorCode {
    /// Parse the code out of a provider error message.
    #[must_use]
    pub fn from_message(message: &str) -> Self {
        let code = message.split(':').next().unwrap_or_default().trim();
        match code {
            "EMAIL_NOT_FOUND" => Self::UserNotFound,
            "INVALID_PASSWORD" => Self::WrongPassword,
            "INVALID_LOGIN_CREDENTIALS" => Self::InvalidCredential,
            "EMAIL_EXISTS" => Self::EmailExists,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => Self::OperationNotAllowed,
            "CONFIGURATION_NOT_FOUND" => Self::ConfigurationNotFound,
            _ => Self::Other(message.to_owned()),
        }
    }

    /// Sign-in failures that are answered by registering the account.
    #[must_use]
    pub const fn triggers_registration(&self) -> bool {
        matches!(self, Self::UserNotFound | Self::InvalidCredential)
    }

    /// Message shown to the person signing in.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UserNotFound | Self::InvalidCredential => "Email ou senha incorretos.".to_owned(),
            Self::WrongPassword => "A senha está incorreta para este e-mail.".to_owned(),
            Self::EmailExists => "Este email já existe. Tente logar ou use outra senha.".to_owned(),
            Self::WeakPassword => "A senha deve ter pelo menos 6 caracteres.".to_owned(),
            Self::InvalidEmail => "Email inválido.".to_owned(),
            Self::UserDisabled => "Esta conta foi desativada.".to_owned(),
            Self::TooManyAttempts => "Muitas tentativas. Tente novamente mais tarde.".to_owned(),
            Self::OperationNotAllowed | Self::ConfigurationNotFound => {
                "AÇÃO NECESSÁRIA: Ative \"Email/Senha\" no Firebase Console > Authentication."
                    .to_owned()
            }
            Self::Other(message) => format!("Erro ao conectar: {message}"),
        }
    }
}

/// Errors from sign-in, registration and session handling.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password left blank.
    #[error("email and password are required")]
    MissingCredentials,

    /// Email rejected before contacting the provider.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Provider rejected the request.
    #[error("auth provider error: {message}")]
    Provider {
        code: AuthErrorCode,
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response had an unexpected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Account created but its profile could not be stored.
    #[error("profile error: {0}")]
    Profile(#[from] DirectoryError),
}

impl AuthError {
    /// Message shown to the person signing in.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredentials => "Preencha todos os campos obrigatórios.".to_owned(),
            Self::InvalidEmail(_) => AuthErrorCode::InvalidEmail.user_message(),
            Self::Provider { code, .. } => code.user_message(),
            Self::Http(_) | Self::Parse(_) | Self::Profile(_) => {
                "Erro ao conectar: Verifique sua conexão.".to_owned()
            }
        }
    }

    /// Provider code, when the provider rejected the request.
    #[must_use]
    pub const fn code(&self) -> Option<&AuthErrorCode> {
        match self {
            Self::Provider { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Error envelope returned by the identity provider.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}
