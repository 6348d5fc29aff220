//! Opportunistic H2 -> H3 upgrade probe, gated behind `h3-upgrade-probe`.
//! Disabled by default: see the crate-level note in `Cargo.toml`.

use std::net::ToSocketAddrs;
use std::sync::Arc;

use bytes::Bytes;
use h123_transport::h3_client::H3Client;

use crate::entry::{Entry, Transport};

/// Issues a HEAD request on the entry's current transport and, if the
/// response advertises HTTP/3 via `Alt-Svc`, dials it and swaps the
/// entry's transport in place. Any failure along the way is absorbed: the
/// entry keeps working on its original transport.
pub(crate) async fn probe(entry: &Arc<Entry>, endpoint: &quinn::Endpoint) {
	let (scheme, host) = {
		let state = entry.state.read();
		(entry.scheme.clone(), state.host.clone())
	};

	let uri = match format!("{scheme}://{host}/").parse::<http::Uri>() {
		Ok(u) => u,
		Err(_) => return,
	};
	let req = match http::Request::head(uri).body(Bytes::new()) {
		Ok(r) => r,
		Err(_) => return,
	};

	let resp = {
		let transport = entry.state.read().transport.clone();
		let Transport::Http(http) = transport else {
			return;
		};
		match http.send(req).await {
			Ok(r) => r,
			Err(_) => return,
		}
	};

	let Some(alt_svc) = resp.headers().get("alt-svc").and_then(|v| v.to_str().ok()) else {
		return;
	};

	for part in alt_svc.split(';') {
		let part = part.trim();
		let Some(rest) = part.strip_prefix("h3=") else {
			continue;
		};
		let Ok(mut quic_host) = serde_json::from_str::<String>(rest) else {
			return;
		};
		if let Some(suffix) = quic_host.strip_prefix(':') {
			let hostname = host.split(':').next().unwrap_or(&host);
			quic_host = format!("{hostname}{suffix}");
		}

		let Some(addr) = quic_host
			.to_socket_addrs()
			.ok()
			.and_then(|mut it| it.next())
		else {
			return;
		};
		let server_name = quic_host.split(':').next().unwrap_or(&quic_host).to_string();

		match H3Client::dial(endpoint, addr, &server_name).await {
			Ok(client) => {
				let mut state = entry.state.write();
				state.host = quic_host;
				state.is_quic = true;
				state.transport = Transport::H3(Arc::new(client));
			},
			Err(_) => return,
		}
		return;
	}
}
