//! `servicedesk-core`: request intake and lifecycle engine.
//!
//! Leaf-first:
//! - [`classifier`]: best-effort client for the external intelligence service
//! - [`store`]: ordered request storage behind the [`store::RequestStore`] seam
//! - [`intake`]: resolves category/priority/sentiment for new requests
//! - [`transition`]: the status state machine
//! - [`query`]: filtered, paginated listing
//! - [`desk`]: the facade wiring the flows together

pub mod classifier;
pub mod desk;
pub mod intake;
pub mod model;
pub mod query;
pub mod store;
pub mod transition;

pub use desk::DeskError;
pub use desk::RequestDesk;
pub use model::Category;
pub use model::NewServiceRequest;
pub use model::Priority;
pub use model::RequestStatus;
pub use model::ServiceRequest;
