//! Per-request handling: uplink accounting, header contract, target
//! parse, and proxying through the connection pool.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use h123_wire::ReflectorResponse;
use http::HeaderMap;

use crate::error::ProxyError;
use crate::uplink::Registry;

const HEADER_BACKEND_HOST: &str = "x-h123-backend-host";
const HEADER_TXN: &str = "x-h123-txn";
const HEADER_UPLINK_CLOSE: &str = "x-h123-uplink-close";

pub struct Context {
	pub uplink: Arc<Registry>,
	pub pool: Arc<dyn h123_pool::UpstreamPool>,
	pub mux_endpoint_url: String,
}

/// Handles one inbound request end to end, never panicking: every failure
/// path is turned into a [`ReflectorResponse`] error envelope.
pub async fn handle(
	ctx: &Context,
	req: http::Request<Bytes>,
	remote: SocketAddr,
) -> http::Response<Bytes> {
	let remote_key = remote.to_string();
	let should_close = req.headers().contains_key(HEADER_UPLINK_CLOSE);
	ctx.uplink.record(&remote_key, req.method().as_str(), &req.uri().to_string());
	if should_close {
		ctx.uplink.close(&remote_key);
	}

	match try_proxy(ctx, &req).await {
		Ok(resp) => resp,
		Err(e) => error_response(ctx, &req, remote, e),
	}
}

async fn try_proxy(
	ctx: &Context,
	req: &http::Request<Bytes>,
) -> Result<http::Response<Bytes>, ProxyError> {
	let headers = req.headers();
	let backend_host = first_header(headers, HEADER_BACKEND_HOST)
		.filter(|v| !v.is_empty())
		.ok_or(ProxyError::MissingHeader("X-H123-Backend-Host"))?;
	first_header(headers, HEADER_TXN).ok_or(ProxyError::MissingHeader("X-H123-Txn"))?;

	let target: http::Uri = backend_host.parse()?;
	let scheme = target.scheme_str().unwrap_or("https").to_string();
	let host = target.authority().map(|a| a.to_string()).unwrap_or_default();
	if host.is_empty() {
		return Err(ProxyError::MissingHeader("X-H123-Backend-Host"));
	}

	let entry = ctx.pool.setup(&scheme, &host).await?;

	let outbound_uri = http::Uri::builder()
		.scheme(scheme.as_str())
		.authority(host.as_str())
		.path_and_query(
			req
				.uri()
				.path_and_query()
				.map(|pq| pq.as_str())
				.unwrap_or("/"),
		)
		.build()?;

	let mut outbound = http::Request::builder().method(req.method()).uri(outbound_uri);
	for (name, value) in req.headers() {
		outbound = outbound.header(name, value);
	}
	let outbound = outbound.body(req.body().clone())?;

	let resp = entry.do_request(outbound).await?;
	Ok(resp)
}

fn first_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name).and_then(|v| v.to_str().ok())
}

fn error_response(
	ctx: &Context,
	req: &http::Request<Bytes>,
	remote: SocketAddr,
	err: ProxyError,
) -> http::Response<Bytes> {
	let body = ReflectorResponse::error(ctx.mux_endpoint_url.clone(), err.to_string());
	let json = serde_json::to_vec(&body).unwrap_or_default();
	tracing::event!(
		target: "uplink",
		tracing::Level::DEBUG,
		remote = %remote,
		url = %req.uri(),
		error = %err,
		"proxy failed"
	);
	http::Response::builder()
		.status(err.status())
		.header(http::header::CONTENT_TYPE, "application/json")
		.body(Bytes::from(json))
		.expect("static response is well-formed")
}
