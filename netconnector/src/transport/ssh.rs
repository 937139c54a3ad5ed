//! SSH transport implementation using russh.
//!
//! Old access switches frequently offer only SHA-1 key exchange and CBC
//! ciphers. When the first handshake fails on algorithm negotiation the
//! algorithms the server offered are read out of the failure text and the
//! handshake is retried once with the recognised ones appended.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, trace, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::{Algorithm, PublicKey};
use russh::{Channel, ChannelMsg, Disconnect, Preferred, cipher, kex, mac};
use secrecy::ExposeSecret;

use super::config::{ConnectConfig, HostKeyVerification};
use super::{Liveness, TerminalStream};
use crate::error::{Result, TransportError};
use crate::model::Credential;

const LEGACY_KEX: &[(&str, kex::Name)] = &[
    ("diffie-hellman-group14-sha1", kex::DH_G14_SHA1),
    ("diffie-hellman-group1-sha1", kex::DH_G1_SHA1),
    ("diffie-hellman-group-exchange-sha1", kex::DH_GEX_SHA1),
];
const LEGACY_CIPHERS: &[(&str, cipher::Name)] = &[
    ("aes128-cbc", cipher::AES_128_CBC),
    ("aes256-cbc", cipher::AES_256_CBC),
];
const LEGACY_MACS: &[(&str, mac::Name)] = &[("hmac-sha1", mac::HMAC_SHA1)];
const SSH_RSA: &str = "ssh-rsa";

/// SSH terminal stream: an authenticated session with one PTY shell channel.
pub struct SshStream {
    session: Handle<SshHandler>,
    channel: Channel<Msg>,
    liveness: Liveness,
    closed: bool,
}

impl SshStream {
    /// Connect, authenticate with `credential`, and open an interactive shell.
    pub async fn connect(host: &str, config: &ConnectConfig, credential: &Credential) -> Result<Self> {
        let mut session = match Self::handshake(host, config, Preferred::default()).await {
            Ok(session) => session,
            Err(TransportError::Ssh(e)) => {
                let text = e.to_string();
                let offered = offered_algorithms(&text);
                if offered.is_empty() {
                    return Err(TransportError::Ssh(e).into());
                }
                warn!("{host}: SSH negotiation failed ({text}), retrying with {offered:?}");
                Self::handshake(host, config, legacy_preferred(&offered)).await?
            }
            Err(e) => return Err(e.into()),
        };

        let accepted = session
            .authenticate_password(&credential.login, credential.password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success();
        if !accepted {
            return Err(TransportError::AuthenticationFailed {
                host: host.to_string(),
                reason: format!("SSH password rejected for '{}'", credential.login),
            }
            .into());
        }

        let channel = session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;
        channel
            .request_pty(
                true,
                "vt100",
                config.terminal_width,
                config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;
        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        debug!("{host}: SSH shell open for '{}'", credential.login);
        Ok(Self {
            session,
            channel,
            liveness: Liveness::new(),
            closed: false,
        })
    }

    async fn handshake(
        host: &str,
        config: &ConnectConfig,
        preferred: Preferred,
    ) -> std::result::Result<Handle<SshHandler>, TransportError> {
        let ssh_config = Arc::new(client::Config {
            preferred,
            inactivity_timeout: None,
            ..Default::default()
        });
        let handler = SshHandler {
            host: host.to_string(),
            port: config.port(),
            host_key_verification: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
        };

        tokio::time::timeout(
            config.connect_timeout,
            client::connect(ssh_config, (host, config.port()), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.connect_timeout))?
        .map_err(TransportError::Ssh)
    }
}

/// Pull the algorithm names a server offered out of a negotiation failure
/// message, keeping only the legacy algorithms this client can enable.
pub fn offered_algorithms(failure: &str) -> Vec<String> {
    let lower = failure.to_ascii_lowercase();
    let theirs = ["theirs", "their offer", "server offer", "offered"]
        .iter()
        .filter_map(|marker| lower.find(marker))
        .min();
    let Some(start) = theirs else {
        return Vec::new();
    };

    let known: Vec<&str> = LEGACY_KEX
        .iter()
        .map(|(text, _)| *text)
        .chain(LEGACY_CIPHERS.iter().map(|(text, _)| *text))
        .chain(LEGACY_MACS.iter().map(|(text, _)| *text))
        .chain(std::iter::once(SSH_RSA))
        .collect();

    let mut offered = Vec::new();
    for token in lower[start..]
        .split(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '@' | '.' | '_')))
        .filter(|t| !t.is_empty())
    {
        if known.contains(&token) && !offered.iter().any(|o| o == token) {
            offered.push(token.to_string());
        }
    }
    offered
}

fn legacy_preferred(offered: &[String]) -> Preferred {
    let base = Preferred::default();
    let is_offered = |name: &str| offered.iter().any(|o| o == name);

    let mut kex_list = base.kex.to_vec();
    for (text, name) in LEGACY_KEX {
        if is_offered(*text) && !kex_list.contains(name) {
            kex_list.push(*name);
        }
    }
    let mut cipher_list = base.cipher.to_vec();
    for (text, name) in LEGACY_CIPHERS {
        if is_offered(*text) && !cipher_list.contains(name) {
            cipher_list.push(*name);
        }
    }
    let mut mac_list = base.mac.to_vec();
    for (text, name) in LEGACY_MACS {
        if is_offered(*text) && !mac_list.contains(name) {
            mac_list.push(*name);
        }
    }
    let mut key_list = base.key.to_vec();
    let ssh_rsa = Algorithm::Rsa { hash: None };
    if is_offered(SSH_RSA) && !key_list.contains(&ssh_rsa) {
        key_list.push(ssh_rsa);
    }

    Preferred {
        kex: Cow::Owned(kex_list),
        key: Cow::Owned(key_list),
        cipher: Cow::Owned(cipher_list),
        mac: Cow::Owned(mac_list),
        ..base
    }
}

#[async_trait]
impl TerminalStream for SshStream {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(TransportError::Disconnected.into());
        }
        if let Err(e) = self.channel.data(data).await {
            self.liveness.mark_dead();
            return Err(TransportError::Ssh(e).into());
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        if self.closed {
            return Ok(None);
        }
        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::ExtendedData { data, .. }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    self.liveness.mark_dead();
                    return Ok(None);
                }
                Some(other) => trace!("ignoring channel message {other:?}"),
            }
        }
    }

    fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.liveness.mark_dead();
        let _ = self.channel.eof().await;
        self.session
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl SshHandler {
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, russh::keys::Error> {
        match self.known_hosts_path {
            Some(ref path) => russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, pubkey),
        }
    }

    fn learn_host_key(&self, pubkey: &PublicKey) {
        let result = match self.known_hosts_path {
            Some(ref path) => {
                russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
            }
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey),
        };
        if let Err(e) = result {
            warn!("{}: failed to save host key: {e}", self.host);
        }
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.host_key_verification {
            HostKeyVerification::Disabled => Ok(true),
            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    self.learn_host_key(server_public_key);
                    Ok(true)
                }
                Err(e) => {
                    warn!("{}: host key rejected: {e}", self.host);
                    Ok(false)
                }
            },
            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(known) => Ok(known),
                Err(e) => {
                    warn!("{}: host key rejected: {e}", self.host);
                    Ok(false)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offered_algorithms_from_russh_style_message() {
        let text = r#"No common Kex algorithm - ours: ["curve25519-sha256"], theirs: ["diffie-hellman-group1-sha1", "diffie-hellman-group14-sha1"]"#;
        assert_eq!(
            offered_algorithms(text),
            vec!["diffie-hellman-group1-sha1", "diffie-hellman-group14-sha1"]
        );
    }

    #[test]
    fn test_offered_algorithms_cipher_and_mac() {
        let text = "Unable to negotiate. Their offer: aes128-cbc,3des-cbc,hmac-sha1";
        assert_eq!(offered_algorithms(text), vec!["aes128-cbc", "hmac-sha1"]);
    }

    #[test]
    fn test_offered_algorithms_ignores_unrelated_failures() {
        assert!(offered_algorithms("Connection reset by peer").is_empty());
    }

    #[test]
    fn test_legacy_preferred_appends() {
        let preferred = legacy_preferred(&["diffie-hellman-group1-sha1".to_string()]);
        assert!(preferred.kex.contains(&kex::DH_G1_SHA1));
        assert_eq!(preferred.cipher.len(), Preferred::default().cipher.len());
    }
}
