//! Port traits defining external boundaries.
//!
//! The transport is the only boundary between the resource client and the
//! storage service. Implementations live in `src/adapters/`.

pub mod transport;

pub use transport::{
    RequestContext, RequestOptions, Transport, TransportFuture, TransportResponse,
};
