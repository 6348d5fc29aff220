use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use h123_backend::proxy::{self, Context};
use h123_backend::uplink::Registry;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote() -> SocketAddr {
	"127.0.0.1:5000".parse().unwrap()
}

fn context(pool: Arc<dyn h123_pool::UpstreamPool>) -> Context {
	Context {
		uplink: Arc::new(Registry::new()),
		pool,
		mux_endpoint_url: "https://mux.example".to_string(),
	}
}

#[tokio::test]
async fn missing_backend_host_header_returns_400() {
	let ctx = context(Arc::new(h123_pool::Pool::new(None)));
	let req = http::Request::builder()
		.method("GET")
		.uri("/x")
		.header("x-h123-txn", "t1")
		.body(Bytes::new())
		.unwrap();
	let resp = proxy::handle(&ctx, req, remote()).await;
	assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn missing_txn_header_returns_400() {
	let ctx = context(Arc::new(h123_pool::Pool::new(None)));
	let req = http::Request::builder()
		.method("GET")
		.uri("/x")
		.header("x-h123-backend-host", "https://origin.example")
		.body(Bytes::new())
		.unwrap();
	let resp = proxy::handle(&ctx, req, remote()).await;
	assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn proxies_post_body_and_custom_headers_verbatim() {
	let origin = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/realback-end/path"))
		.respond_with(
			ResponseTemplate::new(200)
				.insert_header("x-echo", "yes")
				.set_body_string("This Funky Body"),
		)
		.mount(&origin)
		.await;

	let ctx = context(Arc::new(h123_pool::Pool::new(None)));

	let req = http::Request::builder()
		.method("POST")
		.uri("/realback-end/path?query=1")
		.header("x-h123-backend-host", origin.uri())
		.header("x-h123-txn", "Txn1")
		.header("x-mytest-1", "test1")
		.header("x-mytest-2", "test2")
		.body(Bytes::from_static(b"This Funky Body"))
		.unwrap();

	let resp = proxy::handle(&ctx, req, remote()).await;
	assert_eq!(resp.status(), 200);
	assert_eq!(resp.body().as_ref(), b"This Funky Body");
}

#[tokio::test]
async fn malformed_backend_host_returns_502() {
	let ctx = context(Arc::new(h123_pool::Pool::new(None)));
	let req = http::Request::builder()
		.method("GET")
		.uri("/x")
		.header("x-h123-backend-host", "http://bad host")
		.header("x-h123-txn", "t1")
		.body(Bytes::new())
		.unwrap();
	let resp = proxy::handle(&ctx, req, remote()).await;
	assert_eq!(resp.status(), 502);
}

#[tokio::test]
async fn close_header_removes_uplink_session_after_response() {
	let origin = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/x"))
		.respond_with(ResponseTemplate::new(200))
		.mount(&origin)
		.await;

	let ctx = context(Arc::new(h123_pool::Pool::new(None)));
	let req = http::Request::builder()
		.method("GET")
		.uri("/x")
		.header("x-h123-backend-host", origin.uri())
		.header("x-h123-txn", "t1")
		.header("x-h123-uplink-close", "1")
		.body(Bytes::new())
		.unwrap();

	proxy::handle(&ctx, req, remote()).await;
	assert!(ctx.uplink.is_empty());
}
