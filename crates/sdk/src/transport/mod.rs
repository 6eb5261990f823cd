//! Transport layer for the Bugzilla SDK.

pub mod http;

pub use http::HttpTransport;
