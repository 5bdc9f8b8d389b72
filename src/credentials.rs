//! Access token acquisition for the Google Calendar API.
//!
//! Sources, first match wins:
//!   1. `GOOGLE_OAUTH_ACCESS_TOKEN`
//!   2. `GOOGLE_APPLICATION_CREDENTIALS`, or
//!      ~/.config/gcloud/application_default_credentials.json
//!   3. the GCE metadata server, when no credentials file exists
//!
//! User credentials have their refresh token exchanged on every provider
//! start. Service account keys sign a JWT assertion and trade it for a token.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use google_calendar::Client;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const METADATA_HOST: &str = "metadata.google.internal";
const METADATA_TIMEOUT: Duration = Duration::from_secs(3);

/// Application default credentials file, as written by gcloud.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialsFile {
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
    ServiceAccount(ServiceAccountKey),
    #[serde(other)]
    Unsupported,
}

/// JSON key of a service account, as downloaded from the cloud console.
#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Obtain an access token usable for `scope`.
pub async fn access_token(scope: &str) -> Result<String> {
    if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
        if !token.trim().is_empty() {
            debug!("using access token from {}", ACCESS_TOKEN_ENV);
            return Ok(token.trim().to_string());
        }
    }

    let path = credentials_path()?;
    if !path.exists() && std::env::var_os(CREDENTIALS_ENV).is_none() {
        match metadata_token(&metadata_base(), scope).await {
            Ok(token) => {
                debug!("using access token from the metadata server");
                return Ok(token);
            }
            Err(e) => debug!("metadata server unavailable: {:#}", e),
        }
    }

    let creds = load_credentials_file(&path, scope)?;
    debug!(path = %path.display(), "using application default credentials");

    match creds {
        CredentialsFile::AuthorizedUser {
            client_id,
            client_secret,
            refresh_token,
        } => refresh(client_id, client_secret, refresh_token).await,
        CredentialsFile::ServiceAccount(key) => service_account_token(&key, scope)
            .await
            .with_context(|| format!("Service account {} could not sign in", key.client_email)),
        CredentialsFile::Unsupported => bail!(
            "Unsupported credential type in {}. Use authorized_user or service_account credentials.",
            path.display()
        ),
    }
}

fn credentials_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CREDENTIALS_ENV) {
        return Ok(PathBuf::from(path));
    }

    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("gcloud")
        .join("application_default_credentials.json"))
}

fn load_credentials_file(path: &Path, scope: &str) -> Result<CredentialsFile> {
    if !path.exists() {
        bail!(
            "Google credentials not found at {}.\n\n\
            Create them with:\n\n  \
            gcloud auth application-default login --scopes=openid,{}\n\n\
            or set {} to an access token.",
            path.display(),
            scope,
            ACCESS_TOKEN_ENV
        );
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse credentials from {}", path.display()))
}

async fn refresh(client_id: String, client_secret: String, refresh_token: String) -> Result<String> {
    let client = Client::new(
        client_id,
        client_secret,
        String::new(),
        String::new(),
        refresh_token,
    );

    let token = client
        .refresh_access_token()
        .await
        .context("Failed to refresh Google access token")?;

    if token.access_token.is_empty() {
        bail!("Google returned an empty access token");
    }

    Ok(token.access_token)
}

/// Sign a one hour assertion for `scope` with the service account's key.
fn assertion(key: &ServiceAccountKey, scope: &str, now: DateTime<Utc>) -> Result<String> {
    let claims = Claims {
        iss: key.client_email.clone(),
        scope: scope.to_string(),
        aud: key.token_uri.clone(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::hours(1)).timestamp(),
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .context("Invalid service account private key")?;
    encode(&header, &claims, &signing_key).context("Failed to sign service account assertion")
}

async fn service_account_token(key: &ServiceAccountKey, scope: &str) -> Result<String> {
    let assertion = assertion(key, scope, Utc::now())?;

    let response = reqwest::Client::new()
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", key.token_uri))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Token exchange failed with {}: {}", status, body.trim());
    }

    let token: TokenResponse = response
        .json()
        .await
        .context("Failed to decode token response")?;
    non_empty(token)
}

fn metadata_base() -> String {
    let host = std::env::var(METADATA_HOST_ENV).unwrap_or_else(|_| METADATA_HOST.to_string());
    format!("http://{host}")
}

/// Token of the instance's default service account.
async fn metadata_token(base: &str, scope: &str) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(METADATA_TIMEOUT)
        .build()
        .context("Failed to build metadata client")?;

    let token: TokenResponse = client
        .get(format!(
            "{base}/computeMetadata/v1/instance/service-accounts/default/token"
        ))
        .query(&[("scopes", scope)])
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .context("Metadata server request failed")?
        .json()
        .await
        .context("Failed to decode metadata token")?;
    non_empty(token)
}

fn non_empty(token: TokenResponse) -> Result<String> {
    if token.access_token.is_empty() {
        bail!("Google returned an empty access token");
    }
    Ok(token.access_token)
}
