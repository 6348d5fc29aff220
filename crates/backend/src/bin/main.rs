use h123_backend::{BackendConfig, serve};
use rcgen::{CertifiedKey, generate_simple_self_signed};
use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio_util::sync::CancellationToken;

fn build_tls(cfg: &BackendConfig) -> anyhow::Result<ServerConfig> {
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
			let CertifiedKey { cert, signing_key } = generate_simple_self_signed(vec![host.to_string()])?;
			(
				CertificateDer::from(cert.der().to_vec()),
				PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(signing_key.serialize_der())),
			)
		},
	};

	let mut server_config = ServerConfig::builder()
		.with_no_client_auth()
		.with_single_cert(vec![cert_der], key_der)?;
	server_config.alpn_protocols = vec![b"h3".to_vec()];
	Ok(server_config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	h123_core::logging::init();
	let path = std::env::args().nth(1).map(std::path::PathBuf::from);
	let cfg: BackendConfig = h123_core::config::load(path.as_deref())?;
	let tls = build_tls(&cfg)?;
	let stop = CancellationToken::new();
	let stop_on_signal = stop.clone();
	tokio::spawn(async move {
		let _ = tokio::signal::ctrl_c().await;
		stop_on_signal.cancel();
	});
	serve::run(cfg, tls, stop).await
}
