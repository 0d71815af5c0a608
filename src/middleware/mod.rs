pub mod tenant_edge;

pub use tenant_edge::{tenant_edge_middleware, Rewritten, EDGE_HEADER_PREFIX};
