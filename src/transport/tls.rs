//! TLS client setup (rustls with the webpki root set)

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::error::{BotError, Result};

static CLIENT_CONFIG: OnceCell<Arc<ClientConfig>> = OnceCell::new();

fn client_config() -> Result<Arc<ClientConfig>> {
    CLIENT_CONFIG
        .get_or_try_init(|| {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

            let provider = Arc::new(tokio_rustls::rustls::crypto::ring::default_provider());
            let config = ClientConfig::builder_with_provider(provider)
                .with_safe_default_protocol_versions()
                .map_err(|e| BotError::Tls {
                    message: e.to_string(),
                })?
                .with_root_certificates(roots)
                .with_no_client_auth();
            Ok(Arc::new(config))
        })
        .cloned()
}

/// Run the TLS handshake over an established TCP stream
pub async fn wrap(tcp: TcpStream, server: &str) -> Result<TlsStream<TcpStream>> {
    let name = ServerName::try_from(server.to_string()).map_err(|e| BotError::Tls {
        message: format!("Invalid server name '{}': {}", server, e),
    })?;
    let connector = TlsConnector::from(client_config()?);
    connector
        .connect(name, tcp)
        .await
        .map_err(|e| BotError::Tls {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_is_cached() {
        let a = client_config().unwrap();
        let b = client_config().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
