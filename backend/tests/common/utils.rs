use axum::{
    http::header::CONTENT_TYPE,
    response::Response,
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use rand::RngCore;
use tokio::net::TcpListener;

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Read response body as text
pub async fn response_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Random bytes standing in for an image
pub fn generate_test_image(size: usize) -> Vec<u8> {
    let mut buf = vec![0u8; size];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    buf
}

/// Serves `body` as `image/png` at `/car.png` on a random local port
///
/// Returns the base URL; every other path answers 404.
pub async fn spawn_image_server(body: Vec<u8>) -> String {
    let app = Router::new().route(
        "/car.png",
        get(move || {
            let body = body.clone();
            async move { ([(CONTENT_TYPE, "image/png")], body) }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind image server");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{addr}")
}
