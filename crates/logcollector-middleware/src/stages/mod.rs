//! Built-in middleware stages.
//!
//! | Stage | Installed by | Position |
//! |-------|--------------|----------|
//! | [`RequestLogger`] | route registration, debug level only | outermost on the route |
//! | [`FormParser`] | route definition | wherever the route lists it |
//! | [`CorsMiddleware`] | server start | in front of the route table |

mod cors;
mod logger;
mod parse_form;

pub use cors::{headers, AllowedOrigins, CorsBuilder, CorsConfig, CorsMiddleware};
pub use logger::RequestLogger;
pub use parse_form::{FormParser, MAX_FORM_BYTES};
