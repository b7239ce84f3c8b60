//! Credential material for pushing
//!
//! `AuthInfo` is built once per run and lent to the config composer and the
//! push executor.

use crate::feed::FeedSource;
use serde::{Deserialize, Serialize};

/// API key meaning "authenticate as the ambient service identity"
pub const INTERNAL_API_KEY: &str = "VSTS";

/// Placeholder key for external feeds authenticated through `nuget.config`;
/// the tools refuse to push without some key
pub const REQUIRED_API_KEY: &str = "RequiredApiKey";

/// User name written alongside the access token for internal sources
pub const SESSION_TOKEN_USERNAME: &str = "VssSessionToken";

/// User name written alongside a bearer token for external sources
pub const EXTERNAL_TOKEN_USERNAME: &str = "CustomUsername";

/// How a declared external connection authenticates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExternalAuthKind {
    UsernamePassword {
        username: String,
        password: String,
    },
    Token {
        token: String,
    },
    ApiKey {
        #[serde(rename = "apiKey")]
        api_key: String,
    },
    #[default]
    #[serde(other)]
    Unknown,
}

/// A user name and password pair stored in `packageSourceCredentials`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCredential {
    pub username: String,
    pub password: String,
}

/// Credentials for feeds hosted by the build service
#[derive(Debug, Clone)]
pub struct InternalAuthInfo {
    /// URL prefixes that identify internal feeds
    pub uri_prefixes: Vec<String>,
    pub access_token: String,
    /// Secrets are handed to a credential provider instead of a config file
    pub use_credential_provider: bool,
    /// Secrets are written into the temporary config file
    pub use_credential_config: bool,
}

impl InternalAuthInfo {
    /// Whether `uri` belongs to the build service's own feeds
    #[must_use]
    pub fn is_internal_uri(&self, uri: &str) -> bool {
        let uri = uri.to_ascii_lowercase();
        self.uri_prefixes
            .iter()
            .any(|prefix| uri.starts_with(&prefix.to_ascii_lowercase()))
    }
}

/// A declared external connection with its credentials
#[derive(Debug, Clone)]
pub struct ExternalAuthInfo {
    pub source: FeedSource,
    pub kind: ExternalAuthKind,
}

impl ExternalAuthInfo {
    /// The value passed as the tool's API key for this connection
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        match &self.kind {
            ExternalAuthKind::UsernamePassword { .. } | ExternalAuthKind::Token { .. } => {
                Some(REQUIRED_API_KEY.to_owned())
            }
            ExternalAuthKind::ApiKey { api_key } => Some(api_key.clone()),
            ExternalAuthKind::Unknown => None,
        }
    }

    /// The config-file credential for this connection, if it uses one
    #[must_use]
    pub fn credential(&self) -> Option<SourceCredential> {
        match &self.kind {
            ExternalAuthKind::UsernamePassword { username, password } => Some(SourceCredential {
                username: username.clone(),
                password: password.clone(),
            }),
            ExternalAuthKind::Token { token } => Some(SourceCredential {
                username: EXTERNAL_TOKEN_USERNAME.to_owned(),
                password: token.clone(),
            }),
            ExternalAuthKind::ApiKey { .. } | ExternalAuthKind::Unknown => None,
        }
    }
}

/// All credential material for one run
#[derive(Debug, Clone)]
pub struct AuthInfo {
    pub internal: InternalAuthInfo,
    pub external: Vec<ExternalAuthInfo>,
}

impl AuthInfo {
    #[must_use]
    pub const fn new(internal: InternalAuthInfo, external: Vec<ExternalAuthInfo>) -> Self {
        Self { internal, external }
    }

    /// The first declared external connection; the only one ever consulted
    #[must_use]
    pub fn first_external(&self) -> Option<&ExternalAuthInfo> {
        self.external.first()
    }

    /// Credential to store for `source` in the temporary config
    #[must_use]
    pub fn credential_for(&self, source: &FeedSource) -> Option<SourceCredential> {
        if source.is_internal || self.internal.is_internal_uri(&source.uri) {
            if !self.internal.use_credential_config || self.internal.access_token.is_empty() {
                return None;
            }
            return Some(SourceCredential {
                username: SESSION_TOKEN_USERNAME.to_owned(),
                password: self.internal.access_token.clone(),
            });
        }

        self.external
            .iter()
            .find(|ext| ext.source.name == source.name || ext.source.uri == source.uri)
            .and_then(ExternalAuthInfo::credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn internal() -> InternalAuthInfo {
        InternalAuthInfo {
            uri_prefixes: vec!["https://pkgs.dev.azure.com/contoso/".to_owned()],
            access_token: "token".to_owned(),
            use_credential_provider: false,
            use_credential_config: true,
        }
    }

    fn external(kind: ExternalAuthKind) -> ExternalAuthInfo {
        ExternalAuthInfo {
            source: FeedSource::external("nuget.org", "https://api.nuget.org/v3/index.json"),
            kind,
        }
    }

    #[test]
    fn test_api_key_mapping() {
        let up = external(ExternalAuthKind::UsernamePassword {
            username: "u".to_owned(),
            password: "p".to_owned(),
        });
        let token = external(ExternalAuthKind::Token {
            token: "t".to_owned(),
        });
        let key = external(ExternalAuthKind::ApiKey {
            api_key: "k-123".to_owned(),
        });
        let unknown = external(ExternalAuthKind::Unknown);

        assert_eq!(up.api_key().as_deref(), Some(REQUIRED_API_KEY));
        assert_eq!(token.api_key().as_deref(), Some(REQUIRED_API_KEY));
        assert_eq!(key.api_key().as_deref(), Some("k-123"));
        assert_eq!(unknown.api_key(), None);
    }

    #[test]
    fn test_prefix_match_is_case_insensitive() {
        let info = internal();
        assert!(info.is_internal_uri("https://PKGS.dev.azure.com/contoso/_packaging/f/nuget/v3/index.json"));
        assert!(!info.is_internal_uri("https://api.nuget.org/v3/index.json"));
    }

    #[test]
    fn test_internal_credential_uses_session_token() {
        let auth = AuthInfo::new(internal(), Vec::new());
        let source = FeedSource::internal("feed", "https://pkgs.dev.azure.com/contoso/_packaging/feed/nuget/v3/index.json");

        let credential = auth.credential_for(&source).unwrap();
        assert_eq!(credential.username, SESSION_TOKEN_USERNAME);
        assert_eq!(credential.password, "token");
    }

    #[test]
    fn test_internal_credential_skipped_without_credential_config() {
        let mut info = internal();
        info.use_credential_config = false;
        let auth = AuthInfo::new(info, Vec::new());
        let source = FeedSource::internal("feed", "https://pkgs.dev.azure.com/contoso/x");

        assert!(auth.credential_for(&source).is_none());
    }

    #[test]
    fn test_external_credentials_by_kind() {
        let auth = AuthInfo::new(
            internal(),
            vec![external(ExternalAuthKind::Token {
                token: "bearer".to_owned(),
            })],
        );
        let source = auth.first_external().unwrap().source.clone();

        let credential = auth.credential_for(&source).unwrap();
        assert_eq!(credential.username, EXTERNAL_TOKEN_USERNAME);
        assert_eq!(credential.password, "bearer");

        let api_key_auth = AuthInfo::new(
            internal(),
            vec![external(ExternalAuthKind::ApiKey {
                api_key: "k".to_owned(),
            })],
        );
        assert!(api_key_auth.credential_for(&source).is_none());
    }

    #[test]
    fn test_unknown_kind_deserializes() {
        let kind: ExternalAuthKind = serde_json::from_str(r#"{"type":"certificate"}"#).unwrap();
        assert_eq!(kind, ExternalAuthKind::Unknown);
    }
}
