//! TLS configuration and certificate loading.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

/// Load TLS configuration from certificate and key files.
///
/// Both files are checked for usable PEM content first, so a wrong path or
/// an empty file is reported by name instead of as an opaque rustls error.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, io::Error> {
    if !cert_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Certificate file not found: {:?}", cert_path),
        ));
    }
    if !key_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Private key file not found: {:?}", key_path),
        ));
    }

    check_pem(cert_path, key_path)?;
    RustlsConfig::from_pem_file(cert_path, key_path).await
}

fn check_pem(cert_path: &Path, key_path: &Path) -> Result<(), io::Error> {
    let mut reader = BufReader::new(File::open(cert_path)?);
    let certs = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("No certificates in {:?}", cert_path),
        ));
    }

    let mut reader = BufReader::new(File::open(key_path)?);
    if rustls_pemfile::private_key(&mut reader)?.is_none() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("No private key in {:?}", key_path),
        ));
    }
    Ok(())
}
