// strata-proxy: data sources for the strata record store (HTTP + file)

mod envelope;
pub mod error;
pub mod file;
pub mod http;
pub mod transport;

pub use error::Error;
pub use file::FileProxy;
pub use http::HttpProxy;
pub use strata_core::StaticProxy;
pub use transport::{DEFAULT_API_KEY_HEADER, TlsMode, TransportConfig};
