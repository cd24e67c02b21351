//! Credential resolution and remote endpoint construction.

use std::fmt;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::{Error, Result};
use crate::request::{AuthMode, SyncRequest};

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "github.com";

/// Environment variable read for a token when none is passed explicitly.
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

const REDACTED: &str = "***";

/// Shortest token also scrubbed where it appears outside an address.
/// Shorter ones are only redacted in their `:{token}@` position.
const MIN_BARE_SECRET_LEN: usize = 8;

/// Address of the remote repository for one sync.
///
/// In token mode the address embeds the secret. `Display` and `Debug`
/// print a redacted form; only [`RemoteEndpoint::expose_url`] yields the
/// real address, for handing to git.
pub struct RemoteEndpoint {
    url: SecretString,
    redacted: String,
    token: Option<EmbeddedToken>,
}

/// Token as given, and as percent-encoded inside the address.
struct EmbeddedToken {
    raw: SecretString,
    encoded: SecretString,
}

impl RemoteEndpoint {
    /// `https://{owner}:{token}@{host}/{owner}/{name}.git`, with owner and
    /// token percent-encoded as userinfo.
    ///
    /// # Errors
    /// Returns `InvalidRemote` if `host` does not form a valid address.
    pub fn token(host: &str, owner: &str, name: &str, token: &SecretString) -> Result<Self> {
        let invalid = || Error::InvalidRemote(format!("cannot build https address for '{host}'"));

        let mut url =
            Url::parse(&format!("https://{host}/{owner}/{name}.git")).map_err(|_| invalid())?;
        url.set_username(owner).map_err(|()| invalid())?;
        url.set_password(Some(REDACTED)).map_err(|()| invalid())?;
        let redacted = url.to_string();

        url.set_password(Some(token.expose_secret()))
            .map_err(|()| invalid())?;
        let encoded = url.password().unwrap_or_default().to_string();

        Ok(Self {
            url: SecretString::from(url.to_string()),
            redacted,
            token: Some(EmbeddedToken {
                raw: SecretString::from(token.expose_secret().to_string()),
                encoded: SecretString::from(encoded),
            }),
        })
    }

    /// `git@{host}:{owner}/{name}.git`
    #[must_use]
    pub fn key(host: &str, owner: &str, name: &str) -> Self {
        let url = format!("git@{host}:{owner}/{name}.git");
        Self {
            redacted: url.clone(),
            url: SecretString::from(url),
            token: None,
        }
    }

    /// The real address, secret included.
    #[must_use]
    pub fn expose_url(&self) -> &str {
        self.url.expose_secret()
    }

    /// Scrub the token from `text`.
    ///
    /// The full address and any `:{token}@` userinfo are always replaced.
    /// Tokens of at least eight characters are also replaced wherever they
    /// appear on their own. Applied to anything derived from a git
    /// invocation before it is logged.
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        let Some(token) = &self.token else {
            return text.to_string();
        };

        let mut out = text.replace(self.expose_url(), &self.redacted);
        for form in [token.encoded.expose_secret(), token.raw.expose_secret()] {
            if form.is_empty() {
                continue;
            }
            out = out.replace(&format!(":{form}@"), &format!(":{REDACTED}@"));
            if form.len() >= MIN_BARE_SECRET_LEN {
                out = out.replace(form, REDACTED);
            }
        }
        out
    }
}

impl fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted)
    }
}

impl fmt::Debug for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RemoteEndpoint").field(&self.redacted).finish()
    }
}

/// Default location of the SSH key checked in key mode (`~/.ssh/id_rsa`).
///
/// `None` if the home directory cannot be determined.
#[must_use]
pub fn default_key_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ssh").join("id_rsa"))
}

/// Build the remote endpoint for a validated request.
///
/// Key mode only checks that `key_path` exists; the key is never read.
///
/// # Errors
/// Returns `AuthenticationUnavailable` if key mode is selected and no key
/// artifact is present, or token mode is selected without a secret, and
/// `InvalidRemote` if the token address cannot be built for `host`.
pub fn resolve_endpoint(
    request: &SyncRequest,
    key_path: Option<&Path>,
    host: &str,
) -> Result<RemoteEndpoint> {
    match request.mode() {
        AuthMode::Token => {
            let token = request.secret().ok_or_else(|| {
                Error::AuthenticationUnavailable("token required for token-based mode".into())
            })?;
            RemoteEndpoint::token(host, request.owner(), request.name(), token)
        }
        AuthMode::Key => {
            if !key_path.is_some_and(Path::exists) {
                return Err(Error::AuthenticationUnavailable(
                    "key artifact not found - configure key-based auth first".into(),
                ));
            }
            Ok(RemoteEndpoint::key(host, request.owner(), request.name()))
        }
    }
}

/// Read a token from the named environment variable, ignoring blank values.
#[must_use]
pub fn token_from_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
