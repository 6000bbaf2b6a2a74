//! Domain types for client applications.

pub mod application;
pub mod descriptor;
pub mod uri;

pub use application::{ApplicationRecord, ClientType, UnknownClientType, consent_types};
pub use descriptor::ApplicationDescriptor;
pub use uri::AbsoluteUri;
