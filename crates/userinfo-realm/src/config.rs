//! Realm configuration
//!
//! [`RealmConfig`] is built once at startup and shared by reference. It can
//! come from the process environment (the historical variable names), from a
//! TOML/YAML/JSON file with `USERINFO_REALM_*` overrides, or from
//! [`RealmConfig::builder`].

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat, FileSourceFile, Map};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{RealmError, RealmResult};
use crate::groups::ClaimGroups;

/// OAuth provider host
pub const ENV_OAUTH_SERVER: &str = "OAUTH_SERVER";
/// Redirect URL registered with the provider
pub const ENV_REDIRECT_URL: &str = "REDIRECT_URL";
/// Client id
pub const ENV_CLIENT_ID: &str = "REALM_CLIENT_ID";
/// Client secret
pub const ENV_CLIENT_SECRET: &str = "REALM_CLIENT_SECRET";
/// Userinfo endpoint
pub const ENV_USER_INFO_URL: &str = "USER_INFO_URL";
/// Realm instance name
pub const ENV_REALM_NAME: &str = "REALM_NAME";
/// Exchange timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "REALM_TIMEOUT_SECS";
/// Space-separated scopes
pub const ENV_SCOPES: &str = "REALM_SCOPES";

/// Prefix for environment overrides of file configuration
pub const ENV_PREFIX: &str = "USERINFO_REALM";

const DEFAULT_REALM_NAME: &str = "oauth";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Immutable configuration for an [`OAuthRealm`](crate::OAuthRealm)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmConfig {
    /// Realm instance name, used in logs
    #[serde(default = "default_name")]
    pub name: String,

    /// OAuth provider host, without scheme or path (e.g. `idp.example.com`)
    pub oauth_server: String,

    /// Redirect URL registered with the provider
    #[serde(default)]
    pub redirect_url: Option<Url>,

    /// Client id registered with the provider
    #[serde(alias = "realm_client_id")]
    pub client_id: String,

    /// Client secret; never serialized
    #[serde(default, alias = "realm_client_secret", skip_serializing)]
    pub client_secret: Option<SecretString>,

    /// Userinfo endpoint the bearer credential is presented to
    pub user_info_url: Url,

    /// Upper bound for one exchange, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Scopes sent with the exchange
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Characters that separate entries in a delimited `groups` claim.
    /// Whitespace always separates.
    #[serde(default = "default_group_delimiters")]
    pub group_delimiters: String,
}

fn default_name() -> String {
    DEFAULT_REALM_NAME.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_group_delimiters() -> String {
    ClaimGroups::DEFAULT_DELIMITERS.to_string()
}

impl RealmConfig {
    /// Load from the process environment.
    ///
    /// Required: `OAUTH_SERVER`, `REALM_CLIENT_ID`, `USER_INFO_URL`.
    /// Optional: `REDIRECT_URL`, `REALM_CLIENT_SECRET`, `REALM_NAME`,
    /// `REALM_TIMEOUT_SECS`, `REALM_SCOPES`.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Config`] if a required variable is missing, a
    /// value does not parse, or validation fails.
    pub fn from_env() -> RealmResult<Self> {
        Self::from_env_map(std::env::vars())
    }

    /// Load from an explicit set of environment-style variables.
    ///
    /// # Errors
    ///
    /// Same as [`RealmConfig::from_env`].
    pub fn from_env_map<I, K, V>(vars: I) -> RealmResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut builder = Config::builder();
        for (key, value) in vars {
            let value: String = value.into();
            builder = match key.as_ref() {
                ENV_OAUTH_SERVER => builder.set_override("oauth_server", value)?,
                ENV_REDIRECT_URL if !value.is_empty() => {
                    builder.set_override("redirect_url", value)?
                }
                ENV_CLIENT_ID => builder.set_override("client_id", value)?,
                ENV_CLIENT_SECRET if !value.is_empty() => {
                    builder.set_override("client_secret", value)?
                }
                ENV_USER_INFO_URL => builder.set_override("user_info_url", value)?,
                ENV_REALM_NAME => builder.set_override("name", value)?,
                ENV_TIMEOUT_SECS => {
                    let secs: u64 = value.trim().parse().map_err(|_| {
                        RealmError::Config(format!(
                            "{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{value}'"
                        ))
                    })?;
                    builder.set_override("timeout_secs", secs)?
                }
                ENV_SCOPES => {
                    let scopes: Vec<String> =
                        value.split_whitespace().map(str::to_string).collect();
                    builder.set_override("scopes", scopes)?
                }
                _ => builder,
            };
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file (TOML, YAML or JSON, by extension).
    ///
    /// `USERINFO_REALM_*` environment variables override file settings, for
    /// example `USERINFO_REALM_TIMEOUT_SECS=5`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use userinfo_realm::RealmConfig;
    ///
    /// let config = RealmConfig::from_file("realm.toml")?;
    /// # Ok::<(), userinfo_realm::RealmError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Config`] if the file is missing, has an
    /// unsupported extension, does not parse, or fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> RealmResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(RealmError::Config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let format = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml" | "yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => {
                return Err(RealmError::Config(
                    "unsupported configuration file format, use .toml, .yaml, .yml or .json"
                        .to_string(),
                ));
            }
        };
        let source = path.to_str().ok_or_else(|| {
            RealmError::Config(format!("configuration path is not UTF-8: {}", path.display()))
        })?;

        Self::load(File::new(source, format), None)
    }

    fn load(
        file: File<FileSourceFile, FileFormat>,
        env: Option<Map<String, String>>,
    ) -> RealmResult<Self> {
        let config: Self = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Create a configuration builder
    pub fn builder() -> RealmConfigBuilder {
        RealmConfigBuilder::default()
    }

    /// Check the configuration for values the realm cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Config`] naming the first offending field.
    pub fn validate(&self) -> RealmResult<()> {
        let host = self.oauth_server.trim();
        if host.is_empty() {
            return Err(RealmError::Config("oauth_server must not be empty".to_string()));
        }
        if host.contains("://") || host.contains('/') {
            return Err(RealmError::Config(format!(
                "oauth_server must be a bare host, got '{host}'"
            )));
        }
        self.token_url()?;

        match self.user_info_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(RealmError::Config(format!(
                    "user_info_url must use http or https, got '{other}'"
                )));
            }
        }
        if self.user_info_url.host_str().is_none_or(str::is_empty) {
            return Err(RealmError::Config("user_info_url has no host".to_string()));
        }
        if self.user_info_url.fragment().is_some() {
            return Err(RealmError::Config(
                "user_info_url must not contain a fragment".to_string(),
            ));
        }

        if self
            .redirect_url
            .as_ref()
            .is_some_and(|url| url.fragment().is_some())
        {
            return Err(RealmError::Config(
                "redirect_url must not contain a fragment".to_string(),
            ));
        }

        if self.client_id.trim().is_empty() {
            return Err(RealmError::Config("client_id must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(RealmError::Config("timeout_secs must be greater than zero".to_string()));
        }

        Ok(())
    }

    /// Token endpoint derived from the provider host
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Config`] if the host does not form a valid URL.
    pub fn token_url(&self) -> RealmResult<Url> {
        self.provider_url("oauth2/token")
    }

    /// Authorization endpoint derived from the provider host
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Config`] if the host does not form a valid URL.
    pub fn authorization_url(&self) -> RealmResult<Url> {
        self.provider_url("oauth2/auth")
    }

    /// Exchange timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn provider_url(&self, path: &str) -> RealmResult<Url> {
        let raw = format!("https://{}/{path}", self.oauth_server.trim());
        Url::parse(&raw)
            .map_err(|e| RealmError::Config(format!("oauth_server does not form a valid URL: {e}")))
    }
}

/// Builder for [`RealmConfig`]
#[derive(Debug, Default)]
pub struct RealmConfigBuilder {
    name: Option<String>,
    oauth_server: Option<String>,
    redirect_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    user_info_url: Option<String>,
    timeout: Option<Duration>,
    scopes: Vec<String>,
    group_delimiters: Option<String>,
}

impl RealmConfigBuilder {
    /// Realm instance name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// OAuth provider host
    pub fn oauth_server(mut self, host: impl Into<String>) -> Self {
        self.oauth_server = Some(host.into());
        self
    }

    /// Redirect URL
    pub fn redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    /// Client id
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Client secret
    pub fn client_secret(mut self, secret: SecretString) -> Self {
        self.client_secret = Some(secret);
        self
    }

    /// Userinfo endpoint
    pub fn user_info_url(mut self, url: impl Into<String>) -> Self {
        self.user_info_url = Some(url.into());
        self
    }

    /// Exchange timeout; rounded up to whole seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a scope
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Group claim delimiters
    pub fn group_delimiters(mut self, delimiters: impl Into<String>) -> Self {
        self.group_delimiters = Some(delimiters.into());
        self
    }

    /// Build and validate.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Config`] if a required field is missing, a URL
    /// does not parse, or validation fails.
    pub fn build(self) -> RealmResult<RealmConfig> {
        let user_info_url = self
            .user_info_url
            .ok_or_else(|| missing("user_info_url"))
            .and_then(|raw| parse_url("user_info_url", &raw))?;
        let redirect_url = self
            .redirect_url
            .map(|raw| parse_url("redirect_url", &raw))
            .transpose()?;
        let timeout_secs = self.timeout.map_or(DEFAULT_TIMEOUT_SECS, |timeout| {
            let secs = timeout.as_secs();
            if timeout.subsec_nanos() > 0 { secs + 1 } else { secs }
        });

        let config = RealmConfig {
            name: self.name.unwrap_or_else(default_name),
            oauth_server: self.oauth_server.ok_or_else(|| missing("oauth_server"))?,
            redirect_url,
            client_id: self.client_id.ok_or_else(|| missing("client_id"))?,
            client_secret: self.client_secret,
            user_info_url,
            timeout_secs,
            scopes: self.scopes,
            group_delimiters: self.group_delimiters.unwrap_or_else(default_group_delimiters),
        };
        config.validate()?;
        Ok(config)
    }
}

fn missing(field: &str) -> RealmError {
    RealmError::Config(format!("{field} is required"))
}

fn parse_url(field: &str, raw: &str) -> RealmResult<Url> {
    Url::parse(raw)
        .map_err(|e| RealmError::Config(format!("{field} '{raw}' is not a valid URL: {e}")))
}
