pub mod errors;

pub use errors::{ConfigError, RelayError, SinkError, TransportError};

pub type Result<T> = std::result::Result<T, RelayError>;
