//! libssh2-backed transport.

use crate::auth::Credential;
use crate::error::{ConnectError, ExecError};
use crate::known_hosts::fingerprint;
use crate::{Connector, ExecOutput, ExitStatus, HostKeyCheck, RemoteSession, Target};
use ssh2::Session;
use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Connector speaking SSH over TCP through libssh2.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ssh2Connector;

impl Connector for Ssh2Connector {
    type Session = Ssh2Session;

    fn connect(
        &self,
        target: &Target,
        credential: &Credential,
        host_key: &HostKeyCheck,
        timeout: Option<Duration>,
    ) -> Result<Ssh2Session, ConnectError> {
        let address = target.address();
        let socket = resolve(target, &address)?;

        let tcp = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&socket, timeout),
            None => TcpStream::connect(socket),
        }
        .map_err(|source| ConnectError::Dial {
            address: address.clone(),
            source,
        })?;

        let mut session = Session::new().map_err(ConnectError::Session)?;
        if let Some(timeout) = timeout {
            session.set_timeout(timeout_millis(timeout));
        }
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|source| ConnectError::Handshake { address, source })?;

        verify_host_key(&session, host_key)?;
        credential.authenticate(&session, &target.username)?;

        // Commands run without a deadline; only setup is bounded.
        session.set_timeout(0);

        Ok(Ssh2Session { session })
    }
}

fn resolve(target: &Target, address: &str) -> Result<SocketAddr, ConnectError> {
    (target.hostname.as_str(), target.port)
        .to_socket_addrs()
        .map_err(|source| ConnectError::Resolve {
            address: address.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| ConnectError::Resolve {
            address: address.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
        })
}

/// libssh2 treats 0 as "no timeout", so round sub-millisecond values up.
fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX).max(1)
}

fn verify_host_key(session: &Session, check: &HostKeyCheck) -> Result<(), ConnectError> {
    let HostKeyCheck::Trusted(trusted) = check else {
        return Ok(());
    };

    let (presented, _) = session.host_key().ok_or(ConnectError::MissingHostKey)?;
    if presented == trusted.blob.as_slice() {
        Ok(())
    } else {
        Err(ConnectError::HostKeyMismatch {
            expected: trusted.fingerprint(),
            presented: fingerprint(presented),
        })
    }
}

/// An authenticated libssh2 session. Disconnects on drop.
pub struct Ssh2Session {
    session: Session,
}

impl std::fmt::Debug for Ssh2Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ssh2Session")
            .field("authenticated", &self.session.authenticated())
            .finish()
    }
}

impl RemoteSession for Ssh2Session {
    fn exec(&mut self, command_line: &str) -> Result<ExecOutput, ExecError> {
        let mut channel = self.session.channel_session().map_err(ExecError::Start)?;
        channel.exec(command_line).map_err(ExecError::Start)?;

        let mut stdout = Vec::new();
        channel.read_to_end(&mut stdout).map_err(ExecError::Io)?;
        let mut stderr = Vec::new();
        channel
            .stderr()
            .read_to_end(&mut stderr)
            .map_err(ExecError::Io)?;

        channel
            .wait_close()
            .map_err(|e| ExecError::Io(io::Error::from(e)))?;

        let signal = channel
            .exit_signal()
            .map_err(|e| ExecError::Io(io::Error::from(e)))?
            .exit_signal;
        // libssh2 reports 0 when the server sent neither exit-status nor
        // exit-signal, so that case reads as success.
        let exit = match signal {
            Some(_) => ExitStatus::Missing,
            None => ExitStatus::Code(
                channel
                    .exit_status()
                    .map_err(|e| ExecError::Io(io::Error::from(e)))?,
            ),
        };

        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit,
            signal,
        })
    }
}

impl Drop for Ssh2Session {
    fn drop(&mut self) {
        let _ = self.session.disconnect(None, "boomerang finished", None);
    }
}
