//! Hosted auth REST client and the post sign-in access gate.

use std::time::Duration;

use regex::Regex;
use reqwest::{Client, StatusCode, Url};
use sea_orm::DatabaseConnection;
use sea_orm::prelude::Uuid;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::BackendConfig;
use crate::db;
use crate::error::{AppError, Result};
use crate::models::Perfil;
use crate::permissions::{Capability, CapabilityBridge, ensure_all};

/// Shown when the email has no row in `usuarios`.
pub const NOT_ENABLED_MESSAGE: &str = "Tu correo no está habilitado en el sistema.";
/// Shown when the sign-in capabilities are refused.
pub const PERMISSIONS_MESSAGE: &str = "Debes conceder permisos para continuar";

/// Identity returned by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthUser {
    pub fn uid(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.id).map_err(|e| AppError::parse(format!("Invalid user id '{}': {e}", self.id)))
    }
}

/// Signed-in session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl AuthErrorBody {
    fn detail(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message).or(self.error)
    }
}

/// Client for the auth endpoints under `{url}/auth/v1`.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
    redirect_url: String,
}

impl AuthClient {
    /// Create a client from the backend settings.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            redirect_url: config.oauth_redirect_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{base}/auth/v1/{path}", base = self.base_url)
    }

    /// Email and password sign-in.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .post(self.endpoint("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email.trim(), "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let session: Session = response.json().await?;
        info!("Signed in as {}", email.trim());
        Ok(session)
    }

    /// Fetch the identity behind a session.
    pub async fn get_user(&self, session: &Session) -> Result<AuthUser> {
        let response = self
            .client
            .get(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        Ok(response.json().await?)
    }

    /// Revoke the session. An already expired token counts as signed out.
    pub async fn sign_out(&self, session: &Session) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(()),
            _ => Err(Self::error_from(response).await),
        }
    }

    /// Browser URL starting the OAuth flow for `provider` (e.g. `google`).
    pub fn oauth_authorize_url(&self, provider: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint("authorize"))
            .map_err(|e| AppError::config(format!("Invalid backend URL: {e}")))?;
        url.query_pairs_mut().append_pair("provider", provider);
        if !self.redirect_url.is_empty() {
            url.query_pairs_mut().append_pair("redirect_to", &self.redirect_url);
        }
        Ok(url)
    }

    async fn error_from(response: reqwest::Response) -> AppError {
        let status = response.status();
        let detail = response
            .json::<AuthErrorBody>()
            .await
            .ok()
            .and_then(AuthErrorBody::detail)
            .unwrap_or_else(|| status.to_string());
        warn!("Auth request failed ({}): {}", status, detail);
        AppError::auth(detail)
    }
}

/// Read the session out of the OAuth callback URL.
///
/// Tokens arrive in the fragment (`#access_token=...`); some providers put
/// them in the query instead.
pub fn session_from_redirect(redirect: &str) -> Result<Session> {
    let url = Url::parse(redirect.trim()).map_err(|e| AppError::parse(format!("Invalid callback URL: {e}")))?;

    let params: Vec<(String, String)> = match url.fragment() {
        Some(fragment) if fragment.contains("access_token") => fragment_pairs(fragment),
        _ => url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect(),
    };

    let get = |key: &str| params.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());

    if let Some(error) = get("error_description").or_else(|| get("error")) {
        return Err(AppError::auth(error));
    }

    let access_token = get("access_token").ok_or_else(|| AppError::auth("El enlace de acceso no contiene una sesión"))?;

    Ok(Session {
        access_token,
        refresh_token: get("refresh_token"),
        expires_in: get("expires_in").and_then(|v| v.parse().ok()),
        user: None,
    })
}

/// Decode a `a=1&b=2` fragment with query-string rules.
fn fragment_pairs(fragment: &str) -> Vec<(String, String)> {
    match Url::parse(&format!("http://localhost/?{fragment}")) {
        Ok(url) => url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect(),
        Err(_) => Vec::new(),
    }
}

/// Check a first-login display name: at least first and last name.
pub fn validate_nombre(nombre: &str) -> Result<String> {
    let re = Regex::new(r"^[a-zA-ZáéíóúÁÉÍÓÚñÑüÜ'-]{2,}(\s+[a-zA-ZáéíóúÁÉÍÓÚñÑüÜ'-]{2,})+$")
        .map_err(|e| AppError::parse(e.to_string()))?;

    let trimmed = nombre.trim();
    if re.is_match(trimmed) {
        Ok(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
    } else {
        Err(AppError::validation(
            "Por favor, ingresa un nombre y apellido válidos (ej: Juan Pérez).",
        ))
    }
}

/// Admits a signed-in identity only when it is enabled in `usuarios`.
pub struct AccessGate<'a> {
    pub db: &'a DatabaseConnection,
    pub auth: &'a AuthClient,
    pub capabilities: &'a dyn CapabilityBridge,
}

impl AccessGate<'_> {
    /// Resolve the profile for `session`, signing out on any refusal.
    pub async fn admit(&self, session: &Session) -> Result<Perfil> {
        let user = match &session.user {
            Some(user) if user.email.is_some() => user.clone(),
            _ => self.auth.get_user(session).await?,
        };

        let uid = user.uid();
        let linked = match &uid {
            Ok(uid) => db::usuario::find_by_auth_uid(self.db, *uid).await?,
            Err(_) => None,
        };

        let usuario = match linked {
            Some(usuario) => usuario,
            None => {
                let email = user.email.clone().unwrap_or_default();
                let Some(usuario) = db::usuario::find_by_email(self.db, &email).await? else {
                    warn!("Rejected sign-in for {}: not enabled", email);
                    self.sign_out_quietly(session).await;
                    return Err(AppError::AccessDenied(NOT_ENABLED_MESSAGE.to_string()));
                };
                match uid {
                    Ok(uid) => db::usuario::link_auth_uid(self.db, usuario.id, uid)
                        .await?
                        .unwrap_or(usuario),
                    Err(e) => {
                        warn!("Auth user id not linked: {}", e);
                        usuario
                    }
                }
            }
        };

        if ensure_all(self.capabilities, &Capability::SIGN_IN).is_err() {
            self.sign_out_quietly(session).await;
            return Err(AppError::AccessDenied(PERMISSIONS_MESSAGE.to_string()));
        }

        let perfil = Perfil::from(usuario);
        info!("Bienvenido/a, {}", perfil.display_name());
        Ok(perfil)
    }

    async fn sign_out_quietly(&self, session: &Session) {
        if let Err(e) = self.auth.sign_out(session).await {
            warn!("Sign-out after refusal failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AuthClient {
        let config = BackendConfig {
            url: "https://demo.supabase.co/".to_string(),
            oauth_redirect_url: "http://localhost:3000/auth/callback".to_string(),
            ..BackendConfig::default()
        };
        AuthClient::new(&config).unwrap()
    }

    #[test]
    fn test_oauth_authorize_url() {
        let url = client().oauth_authorize_url("google").unwrap();
        assert_eq!(url.path(), "/auth/v1/authorize");
        let query = url.query().unwrap();
        assert!(query.contains("provider=google"));
        assert!(query.contains("redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));
    }

    #[test]
    fn test_session_from_fragment() {
        let session = session_from_redirect(
            "http://localhost:3000/auth/callback#access_token=abc.def&refresh_token=r1&expires_in=3600&token_type=bearer",
        )
        .unwrap();
        assert_eq!(session.access_token, "abc.def");
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
        assert_eq!(session.expires_in, Some(3600));
    }

    #[test]
    fn test_session_from_error_redirect() {
        let err = session_from_redirect("http://localhost:3000/auth/callback?error=access_denied&error_description=User+cancelled")
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(msg) if msg == "User cancelled"));
    }

    #[test]
    fn test_session_missing_token() {
        assert!(session_from_redirect("http://localhost:3000/auth/callback").is_err());
        assert!(session_from_redirect("not a url").is_err());
    }

    #[test]
    fn test_validate_nombre() {
        assert_eq!(validate_nombre("  Juan   Pérez ").unwrap(), "Juan Pérez");
        assert!(validate_nombre("María José O'Neill").is_ok());
        assert!(validate_nombre("Ñuño Peña-Ríos").is_ok());
        assert!(validate_nombre("Juan").is_err());
        assert!(validate_nombre("J P").is_err());
        assert!(validate_nombre("asd123 qwe").is_err());
    }

    #[test]
    fn test_auth_user_uid() {
        let user = AuthUser {
            id: "0f8fad5b-d9cb-469f-a165-70867728950e".to_string(),
            email: Some("ana@nexa.cl".to_string()),
        };
        assert!(user.uid().is_ok());

        let bad = AuthUser {
            id: "nope".to_string(),
            email: None,
        };
        assert!(bad.uid().is_err());
    }
}
