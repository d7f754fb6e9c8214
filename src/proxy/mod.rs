pub mod router;
pub mod server;
pub mod static_files;

pub use server::ProxyServer;
