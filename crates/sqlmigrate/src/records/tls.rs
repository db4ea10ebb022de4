//! TLS for PostgreSQL record stores, driven by the datasource's `sslmode`.
//!
//! `tokio-postgres` only understands `disable`, `prefer` and `require`, so the
//! `verify-ca` and `verify-full` modes are read here and passed on to the
//! driver as `require`, with certificate verification done by the rustls
//! connector.

use std::borrow::Cow;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{debug, warn};

use crate::error::{MigrateError, Result};

/// PostgreSQL `sslmode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    Disable,
    Allow,
    /// Driver default when `sslmode` is absent.
    #[default]
    Prefer,
    /// Encrypt, but accept any server certificate.
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "allow" => Ok(SslMode::Allow),
            "prefer" | "" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            other => Err(MigrateError::Config(format!(
                "Invalid sslmode '{}'. Valid values: disable, allow, prefer, require, verify-ca, verify-full",
                other
            ))),
        }
    }

    /// Read `sslmode` from a libpq key/value string or a `postgres://` URL.
    pub fn from_datasource(datasource: &str) -> Result<Self> {
        match find_sslmode(datasource) {
            Some((_, value)) => Self::parse(value),
            None => Ok(SslMode::default()),
        }
    }

    pub fn requires_tls(&self) -> bool {
        matches!(
            self,
            SslMode::Require | SslMode::VerifyCa | SslMode::VerifyFull
        )
    }

    /// Build the rustls connector, or `None` when the connection stays plain.
    pub fn connector(&self) -> Result<Option<MakeRustlsConnect>> {
        if !self.requires_tls() {
            return Ok(None);
        }
        Ok(Some(MakeRustlsConnect::new(self.client_config()?)))
    }

    fn client_config(&self) -> Result<ClientConfig> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| MigrateError::Config(format!("TLS setup failed: {}", e)))?;

        let config = match self {
            SslMode::Require => {
                warn!(
                    "sslmode=require encrypts the connection but does not verify the server \
                     certificate; use sslmode=verify-full to verify it"
                );
                builder
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(AcceptAnyCert { provider }))
                    .with_no_client_auth()
            }
            _ => {
                // rustls always checks the host name, so verify-ca behaves as verify-full
                debug!("sslmode={:?}: verifying server certificate against webpki roots", self);
                let mut roots = RootCertStore::empty();
                roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
                builder.with_root_certificates(roots).with_no_client_auth()
            }
        };
        Ok(config)
    }
}

/// Rewrite the datasource so `tokio-postgres` can parse its `sslmode`.
pub(crate) fn driver_datasource(datasource: &str) -> Cow<'_, str> {
    match find_sslmode(datasource) {
        Some((start, value))
            if value.eq_ignore_ascii_case("verify-ca")
                || value.eq_ignore_ascii_case("verify-full") =>
        {
            let mut rewritten = String::with_capacity(datasource.len());
            rewritten.push_str(&datasource[..start]);
            rewritten.push_str("require");
            rewritten.push_str(&datasource[start + value.len()..]);
            Cow::Owned(rewritten)
        }
        _ => Cow::Borrowed(datasource),
    }
}

/// Locate the `sslmode` value: its byte offset and text.
fn find_sslmode(datasource: &str) -> Option<(usize, &str)> {
    const KEY: &str = "sslmode=";
    let mut from = 0;
    while let Some(pos) = datasource[from..].find(KEY) {
        let key_start = from + pos;
        let at_boundary = datasource[..key_start]
            .chars()
            .next_back()
            .map_or(true, |c| c.is_whitespace() || c == '?' || c == '&');
        let start = key_start + KEY.len();
        if at_boundary {
            let rest = &datasource[start..];
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '&')
                .unwrap_or(rest.len());
            return Some((start, &rest[..end]));
        }
        from = start;
    }
    None
}

/// Certificate verifier for `sslmode=require`: any certificate is accepted,
/// handshake signatures are still checked.
#[derive(Debug)]
struct AcceptAnyCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
