pub mod http;
pub mod traits;

pub use http::HttpConnector;
pub use traits::Connector;
