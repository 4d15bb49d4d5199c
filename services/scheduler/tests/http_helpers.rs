use axum::body::Body;
use axum::http::Request;

// Identity arrives via trusted gateway headers; tests set them directly.
pub fn json_request(method: &str, uri: &str, user: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-user-id", user)
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get_request(uri: &str, user: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-user-id", user)
        .body(Body::empty())
        .expect("request")
}

pub fn admin_get_request(uri: &str, user: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-user-id", user)
        .header("x-user-role", "ADMIN")
        .body(Body::empty())
        .expect("request")
}
