#![allow(dead_code)]

use http_body_util::BodyExt;

pub mod jwt;
pub mod util;

pub async fn body_string(response: http::Response<http_body_util::Full<bytes::Bytes>>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
