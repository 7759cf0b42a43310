//! TLS client configuration with a logging certificate verifier

use std::fmt::Write as _;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use sha2::{Digest, Sha256};

/// Verifies peers against the Mozilla root set and logs each presented certificate
///
/// The verdict is always the WebPKI verifier's; this type only observes.
#[derive(Debug)]
pub struct LoggingVerifier {
    inner: Arc<WebPkiServerVerifier>,
}

impl LoggingVerifier {
    pub fn new(inner: Arc<WebPkiServerVerifier>) -> Self {
        Self { inner }
    }
}

impl ServerCertVerifier for LoggingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let verdict = self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        );

        let server = server_name.to_str();
        let fingerprint = certificate_fingerprint(end_entity);
        let chain = intermediates.len() + 1;
        match &verdict {
            Ok(_) => tracing::info!(
                server = %server,
                fingerprint = %fingerprint,
                chain,
                "Peer certificate verified"
            ),
            Err(e) => tracing::warn!(
                server = %server,
                fingerprint = %fingerprint,
                chain,
                error = %e,
                "Peer certificate rejected"
            ),
        }
        verdict
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Build the client configuration used for every TLS session
pub fn client_config() -> Result<ClientConfig, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let roots: RootCertStore = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let webpki = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone())
        .build()
        .map_err(|e| rustls::Error::General(e.to_string()))?;

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(LoggingVerifier::new(webpki)))
        .with_no_client_auth();

    Ok(config)
}

/// Colon-separated SHA-256 fingerprint of a DER certificate
pub fn certificate_fingerprint(cert: &CertificateDer<'_>) -> String {
    let digest = Sha256::digest(cert.as_ref());
    digest
        .iter()
        .enumerate()
        .fold(String::with_capacity(95), |mut out, (i, byte)| {
            if i > 0 {
                out.push(':');
            }
            let _ = write!(out, "{byte:02X}");
            out
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_format() {
        let cert = CertificateDer::from(vec![0_u8; 16]);
        let fingerprint = certificate_fingerprint(&cert);
        assert_eq!(fingerprint.len(), 95);
        assert_eq!(fingerprint.split(':').count(), 32);
        assert!(fingerprint
            .chars()
            .all(|c| c == ':' || c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_client_config_builds() {
        let config = client_config().unwrap();
        assert!(config.alpn_protocols.is_empty());
    }
}
