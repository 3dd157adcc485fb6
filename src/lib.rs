// Wallet Serve Library
// Local static server that exposes the mobile wallet page to phones on the same network

pub mod advertiser;
pub mod error;
pub mod local_server;

pub use advertiser::{AccessUrls, InterfaceEnumerator, SystemInterfaces};
pub use error::ServerError;
pub use local_server::{LocalServer, LocalServerConfig, ServerHandle};
