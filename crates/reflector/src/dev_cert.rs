//! Self-signed localhost certificate for local manual testing. Loading a
//! real cert/key pair from disk is the normal path; this is only reached
//! when a binary starts with no configured `certFile`/`keyFile`.

use rcgen::{CertifiedKey, generate_simple_self_signed};

pub struct DevCert {
	pub cert_der: Vec<u8>,
	pub key_der: Vec<u8>,
}

pub fn generate(hostname: &str) -> anyhow::Result<DevCert> {
	let CertifiedKey { cert, signing_key } =
		generate_simple_self_signed(vec![hostname.to_string()])?;
	Ok(DevCert {
		cert_der: cert.der().to_vec(),
		key_der: signing_key.serialize_der(),
	})
}
