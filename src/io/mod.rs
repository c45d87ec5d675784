mod http_origin;
mod origin;

pub use http_origin::{HttpBody, HttpOrigin};
pub use origin::{Origin, OriginBody};
