//! HTTP request handlers for the web server.

mod annotations_api;
mod health;

pub use annotations_api::create_annotations;
pub use health::health;
