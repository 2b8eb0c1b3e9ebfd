//! IMAP session lifecycle: connect, identify, select read-only, log out.

use std::fmt;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_imap::Session;
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use futures_util::io::{AsyncRead, AsyncWrite};
use log::{debug, info, warn};
use secrecy::ExposeSecret;

use crate::config::{ClientId, IntakeConfig};

use super::enumerator;
use super::error::{EmailError, Result};
use super::mailbox::{Mailbox, MessageStream};

/// Type alias for the underlying async stream (using async-std compatible TcpStream).
type AsyncTcpStream = async_io::Async<TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
pub(crate) type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

/// Connection state of an [`ImapSession`].
pub enum SessionState {
    Disconnected,
    Connected(Box<Session<TlsStream>>),
}

/// Mailbox session against one IMAP server and folder.
///
/// The folder is opened with `EXAMINE`, so nothing is marked as read and no
/// flags are changed.
pub struct ImapSession {
    config: IntakeConfig,
    state: SessionState,
}

impl ImapSession {
    /// Creates a disconnected session for the given configuration.
    pub fn new(config: IntakeConfig) -> Self {
        Self {
            config,
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn address(&self) -> String {
        format!("{}:{}", self.config.imap_server, self.config.imap_port)
    }

    /// TCP connect, TLS, login, `ID` and `EXAMINE`.
    async fn open(&self) -> Result<Session<TlsStream>> {
        let password = self.config.password_sources().resolve()?;

        let tcp_stream = connect_tcp(
            &self.config.imap_server,
            self.config.imap_port,
            self.config.connect_timeout(),
        )
        .await?;

        let tls_stream = TlsConnector::new()
            .connect(&self.config.imap_server, tcp_stream)
            .await?;

        let client = async_imap::Client::new(tls_stream);
        let mut session = client
            .login(&self.config.username, password.expose_secret())
            .await
            .map_err(|(e, _)| EmailError::AuthenticationFailed(e.to_string()))?;
        debug!("Authenticated as {}", self.config.username);

        if let Err(e) =
            handshake(&mut session, self.config.client_id.as_ref(), &self.config.folder).await
        {
            if let Err(logout_err) = session.logout().await {
                debug!("Logout after failed handshake also failed: {}", logout_err);
            }
            return Err(e);
        }

        Ok(session)
    }

    fn session_mut(&mut self) -> Result<&mut Session<TlsStream>> {
        match &mut self.state {
            SessionState::Connected(session) => Ok(session),
            SessionState::Disconnected => Err(EmailError::NotConnected),
        }
    }
}

/// Identifies the client (when configured) and opens `folder` read-only.
///
/// Either command failing is a `ProtocolError`: nothing can be enumerated
/// without a selected folder.
async fn handshake<T>(
    session: &mut Session<T>,
    client_id: Option<&ClientId>,
    folder: &str,
) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + fmt::Debug + Send,
{
    if let Some(ClientId { name, version }) = client_id {
        session
            .id([("name", Some(name.as_str())), ("version", Some(version.as_str()))])
            .await
            .map_err(|e| EmailError::ProtocolError(format!("ID command rejected: {}", e)))?;
        debug!("Identified as {} {}", name, version);
    }

    let mailbox = session.examine(folder).await.map_err(|e| {
        EmailError::ProtocolError(format!("Failed to open '{}' read-only: {}", folder, e))
    })?;
    info!("Opened '{}' read-only ({} messages)", folder, mailbox.exists);
    Ok(())
}

/// Resolves `host` and connects to the first reachable address.
///
/// `std::net` has no async resolver or connect timeout, so this runs on the
/// blocking pool.
async fn connect_tcp(host: &str, port: u16, timeout: Duration) -> Result<AsyncTcpStream> {
    let host = host.to_string();
    let std_stream = tokio::task::spawn_blocking(move || -> Result<TcpStream> {
        let addrs = (host.as_str(), port)
            .to_socket_addrs()
            .map_err(|e| EmailError::ConnectionFailed(format!("resolving {}: {}", host, e)))?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    last_error = Some(EmailError::Timeout(format!("connecting to {}", addr)));
                }
                Err(e) => last_error = Some(EmailError::ConnectionFailed(e.to_string())),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            EmailError::ConnectionFailed(format!("{} resolved to no addresses", host))
        }))
    })
    .await
    .map_err(|e| EmailError::ConnectionFailed(e.to_string()))??;

    std_stream
        .set_nonblocking(true)
        .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
    async_io::Async::new(std_stream).map_err(|e| EmailError::ConnectionFailed(e.to_string()))
}

#[async_trait]
impl Mailbox for ImapSession {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            debug!("Already connected to IMAP server");
            return Ok(());
        }

        let timeout = self.config.connect_timeout();
        info!("Connecting to IMAP server at {}", self.address());

        let session = tokio::time::timeout(timeout, self.open())
            .await
            .map_err(|_| {
                EmailError::Timeout(format!(
                    "session setup with {} exceeded {}s",
                    self.address(),
                    timeout.as_secs()
                ))
            })??;

        self.state = SessionState::Connected(Box::new(session));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, SessionState::Disconnected) {
            SessionState::Connected(mut session) => {
                info!("Disconnecting from IMAP server");
                session
                    .logout()
                    .await
                    .map_err(|e| EmailError::ProtocolError(e.to_string()))?;
            }
            SessionState::Disconnected => debug!("Already disconnected"),
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected(_))
    }

    async fn uids(&mut self) -> Result<Vec<String>> {
        let uids = enumerator::search_uids(self.session_mut()?).await?;
        Ok(uids.into_iter().map(|uid| uid.to_string()).collect())
    }

    async fn fetch(&mut self, uids: Vec<String>) -> Result<MessageStream<'_>> {
        let uids = enumerator::parse_uids(&uids)?;
        enumerator::fetch(self.session_mut()?, uids).await
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.config.imap_server, self.config.folder)
    }
}

impl Drop for ImapSession {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("ImapSession dropped without explicit disconnect - session will be closed");
        }
    }
}
