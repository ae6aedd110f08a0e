use std::fmt;

/// Credential wrapper that never reveals its value through `Debug` or
/// `Display`. The secret is injected at startup (environment variable or
/// secret store), never embedded in source.
#[derive(Clone, PartialEq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum TransportSecurity {
    #[default]
    None,
    Tls,
}

/// Endpoint configuration for a session. Immutable once the session is
/// opened.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub credential: Option<Secret>,
    pub db_index: u16,
    pub transport_security: TransportSecurity,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            host: "localhost".to_string(),
            port: 6379,
            credential: None,
            db_index: 0,
            transport_security: TransportSecurity::default(),
        }
    }
}

impl SessionConfig {
    /// Reads `KEVA_HOST`, `KEVA_PORT`, `KEVA_PASSWORD` and `KEVA_DB`,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = SessionConfig::default();
        if let Ok(host) = std::env::var("KEVA_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("KEVA_PORT") {
            config.port = port.parse()?;
        }
        if let Ok(password) = std::env::var("KEVA_PASSWORD") {
            config.credential = Some(Secret::new(password));
        }
        if let Ok(db) = std::env::var("KEVA_DB") {
            config.db_index = db.parse()?;
        }
        Ok(config)
    }

    pub fn set_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn set_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn set_credential(mut self, credential: Secret) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn set_db_index(mut self, db_index: u16) -> Self {
        self.db_index = db_index;
        self
    }

    pub fn set_transport_security(mut self, transport_security: TransportSecurity) -> Self {
        self.transport_security = transport_security;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted_in_debug_output() {
        // GIVEN
        let config = SessionConfig::default().set_credential(Secret::new("not-a-real-secret"));

        // WHEN
        let rendered = format!("{:?}", config);

        // THEN
        assert!(!rendered.contains("not-a-real-secret"));
        assert!(rendered.contains("Secret(***)"));
    }

    #[test]
    fn test_addr_joins_host_and_port() {
        // GIVEN
        let config = SessionConfig::default().set_host("127.0.0.1").set_port(7878);

        // THEN
        assert_eq!(config.addr(), "127.0.0.1:7878");
    }

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 6379);
        assert_eq!(config.db_index, 0);
        assert!(config.credential.is_none());
        assert_eq!(config.transport_security, TransportSecurity::None);
    }
}
