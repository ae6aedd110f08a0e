use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::config::{SessionConfig, TransportSecurity};
use crate::domains::SessionError;
use crate::domains::interface::{TRead, TWrite};
use crate::domains::query_io::QueryIO;
use crate::write_array;

/// A caller-owned logical connection to the store. One request is in flight
/// at a time; the session owns its socket exclusively.
pub struct Session {
    stream: TcpStream,
}

impl Session {
    /// Validates the configuration, connects, and authenticates. The link is
    /// verified with a PING before the session is handed to the caller, so a
    /// bad endpoint or credential fails here and not on first use.
    pub async fn open(config: SessionConfig) -> Result<Self, SessionError> {
        if config.host.is_empty() {
            return Err(SessionError::Connection("host must not be empty".into()));
        }
        if config.port == 0 {
            return Err(SessionError::Connection("port must not be zero".into()));
        }
        if config.transport_security == TransportSecurity::Tls {
            return Err(SessionError::Connection(
                "TLS transport is not supported by this client".into(),
            ));
        }

        let stream = TcpStream::connect(config.addr())
            .await
            .map_err(|e| SessionError::Connection(e.to_string()))?;
        let mut session = Session { stream };

        if let Some(credential) = &config.credential {
            if credential.is_empty() {
                return Err(SessionError::Connection("credential must not be empty".into()));
            }
            session
                .expect_ok(write_array!("AUTH", credential.expose().to_string()))
                .await
                .map_err(|e| SessionError::Connection(format!("authentication failed: {e}")))?;
        }

        if config.db_index != 0 {
            session
                .expect_ok(write_array!("SELECT", config.db_index.to_string()))
                .await
                .map_err(|e| SessionError::Connection(format!("select database failed: {e}")))?;
        }

        match session.request(write_array!("PING")).await {
            Ok(QueryIO::SimpleString(s)) if s.as_ref() == b"PONG" => {}
            Ok(other) => {
                return Err(SessionError::Connection(format!("unexpected PING reply: {other:?}")));
            }
            Err(e) => return Err(SessionError::Connection(e.to_string())),
        }

        tracing::info!(addr = %config.addr(), db = config.db_index, "session opened");
        Ok(session)
    }

    /// Writes `value` under `key`, overwriting any existing value. When a
    /// time-to-live is given the store expires the key after that duration.
    pub async fn set(
        &mut self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), SessionError> {
        let command = match ttl {
            Some(ttl) => write_array!(
                "SET",
                key.to_string(),
                value.to_string(),
                "PX",
                ttl.as_millis().to_string()
            ),
            None => write_array!("SET", key.to_string(), value.to_string()),
        };

        self.expect_ok(command).await.map_err(|e| SessionError::Write(e.to_string()))?;
        tracing::debug!(key, "set");
        Ok(())
    }

    /// Returns the current value for `key`. An absent or expired key is
    /// `NotFound`; transport and protocol failures are `Read`.
    pub async fn get(&mut self, key: &str) -> Result<String, SessionError> {
        let reply = self
            .request(write_array!("GET", key.to_string()))
            .await
            .map_err(|e| SessionError::Read(e.to_string()))?;

        match reply {
            QueryIO::BulkString(s) => {
                let value = String::from_utf8(s.into())
                    .map_err(|e| SessionError::Read(e.to_string()))?;
                tracing::debug!(key, "get hit");
                Ok(value)
            }
            QueryIO::Null => Err(SessionError::NotFound),
            QueryIO::Err(e) => Err(SessionError::Read(String::from_utf8_lossy(&e).into_owned())),
            other => Err(SessionError::Read(format!("unexpected GET reply: {other:?}"))),
        }
    }

    /// Releases the connection. Dropping the session closes the socket too;
    /// this makes the release explicit and surfaces shutdown failures.
    pub async fn close(mut self) -> Result<(), SessionError> {
        self.stream
            .shutdown()
            .await
            .map_err(|e| SessionError::Connection(e.to_string()))?;
        tracing::info!("session closed");
        Ok(())
    }

    async fn request(&mut self, command: QueryIO) -> anyhow::Result<QueryIO> {
        TWrite::write(&mut self.stream, &command.serialize()).await?;
        let mut values = self.stream.read_values().await?;
        if values.is_empty() {
            return Err(anyhow::anyhow!("connection closed before a reply arrived"));
        }
        // One command in flight at a time, so the first frame is the reply.
        Ok(values.swap_remove(0))
    }

    async fn expect_ok(&mut self, command: QueryIO) -> anyhow::Result<()> {
        match self.request(command).await? {
            QueryIO::SimpleString(s) if s.as_ref() == b"OK" => Ok(()),
            QueryIO::Err(e) => Err(anyhow::anyhow!(String::from_utf8_lossy(&e).into_owned())),
            other => Err(anyhow::anyhow!("unexpected reply: {other:?}")),
        }
    }
}
