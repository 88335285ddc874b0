pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod history;
pub mod http;
pub mod preselection;
pub mod selection;

pub use config::{Credentials, EngineConfig, Proxy};
pub use dom::{Document, NodeId};
pub use engine::{Engine, Navigation};
pub use error::{Direction, Error, Result};
pub use history::{Entry, History};
pub use http::{
    Method, OutboundRequest, RawResponse, RequestDictionary, Response, Transport, TransportError,
};
pub use preselection::Preselection;
pub use selection::Selection;

/// Open a session on `uri` with the default configuration.
/// This is the primary entry point for strider-core.
#[cfg(feature = "fetch")]
pub fn open(uri: &str) -> Result<Engine> {
    Engine::new(uri)
}
