use std::sync::Arc;

use h123_reflector::{ReflectorConfig, dev_cert, serve};
use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

fn build_tls(cfg: &ReflectorConfig) -> anyhow::Result<ServerConfig> {
	let (cert_der, key_der) = match (&cfg.cert_file, &cfg.key_file) {
		(Some(cert_path), Some(key_path)) => {
			let cert_pem = fs_err::read(cert_path)?;
			let key_pem = fs_err::read(key_path)?;
			let mut certs = rustls_pemfile::certs(&mut cert_pem.as_slice()).collect::<Result<Vec<_>, _>>()?;
			let cert = certs.remove(0);
			let key = rustls_pemfile::private_key(&mut key_pem.as_slice())?
				.ok_or_else(|| anyhow::anyhow!("no private key found in {key_path:?}"))?;
			(cert, key)
		},
		_ => {
			let host = cfg.listen.split(':').next().unwrap_or("localhost");
			let dev = dev_cert::generate(host)?;
			(
				CertificateDer::from(dev.cert_der),
				PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(dev.key_der)),
			)
		},
	};

	let mut server_config = ServerConfig::builder()
		.with_no_client_auth()
		.with_single_cert(vec![cert_der], key_der)?;
	server_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
	Ok(server_config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	h123_core::logging::init();
	let path = std::env::args().nth(1).map(std::path::PathBuf::from);
	let cfg: ReflectorConfig = h123_core::config::load(path.as_deref())?;
	let tls = build_tls(&cfg)?;
	serve::run(cfg, tls).await
}
