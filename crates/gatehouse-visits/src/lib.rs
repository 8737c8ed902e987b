//! Gatehouse Visits — the visit state machine, the signed pass token
//! protocol backing the unauthenticated scan path, and the short-lived
//! active-visit cache.

pub mod limiter;
pub mod pass;
pub mod render;
pub mod service;

pub use limiter::FixedWindowLimiter;
pub use render::{PassRenderer, QrSvgRenderer};
pub use service::{VisitConfig, VisitService, VisitorService};
