use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use h123_reflector::{dev_cert, serve};
use h123_wire::ReflectorResponse;
use http_body_util::{BodyExt, Empty};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client as LegacyClient;
use hyper_util::rt::TokioExecutor;
use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

const ADDR: &str = "127.0.0.1:19443";

fn server_tls(cert_der: &[u8], key_der: &[u8]) -> ServerConfig {
	let mut cfg = ServerConfig::builder()
		.with_no_client_auth()
		.with_single_cert(
			vec![CertificateDer::from(cert_der.to_vec())],
			PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_der.to_vec())),
		)
		.unwrap();
	cfg.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
	cfg
}

fn trusting_client_config(cert_der: &[u8]) -> rustls::ClientConfig {
	let mut roots = rustls::RootCertStore::empty();
	roots.add(CertificateDer::from(cert_der.to_vec())).unwrap();
	rustls::ClientConfig::builder()
		.with_root_certificates(roots)
		.with_no_client_auth()
}

async fn get_protocol(client_config: rustls::ClientConfig, http1_only: bool) -> String {
	let builder = HttpsConnectorBuilder::new()
		.with_tls_config(client_config)
		.https_only();
	let connector = if http1_only {
		builder.enable_http1().build()
	} else {
		builder.enable_http2().build()
	};
	let client = LegacyClient::builder(TokioExecutor::new()).build(connector);
	let resp = client
		.request(
			http::Request::builder()
				.uri(format!("https://{ADDR}/"))
				.body(Empty::<Bytes>::new())
				.unwrap(),
		)
		.await
		.unwrap();
	let body = resp.into_body().collect().await.unwrap().to_bytes();
	let reflected: ReflectorResponse = serde_json::from_slice(&body).unwrap();
	reflected.protocol
}

/// The reflector's h1/h2 listener negotiates whichever protocol the client
/// offers via ALPN and reports it back verbatim in the envelope.
#[tokio::test]
async fn negotiates_http1_or_http2_per_client() {
	let addr: SocketAddr = ADDR.parse().unwrap();
	let dev = dev_cert::generate("127.0.0.1").unwrap();
	let tls = server_tls(&dev.cert_der, &dev.key_der);
	tokio::spawn(serve::serve_h12(addr, tls));
	tokio::time::sleep(Duration::from_millis(100)).await;

	let http1_protocol = get_protocol(trusting_client_config(&dev.cert_der), true).await;
	let http2_protocol = get_protocol(trusting_client_config(&dev.cert_der), false).await;

	assert!(http1_protocol.contains("1.1"), "got {http1_protocol:?}");
	assert!(http2_protocol.contains('2'), "got {http2_protocol:?}");
	assert_ne!(http1_protocol, http2_protocol);
}
