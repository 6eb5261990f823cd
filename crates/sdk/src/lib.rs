//! # Bugzilla SDK
//!
//! Async client for the Bugzilla REST API with a uniform retry policy.
//!
//! ```rust,no_run
//! use bugzilla_sdk::{BugzillaClient, BugzillaResult};
//!
//! # async fn example() -> BugzillaResult<()> {
//! let client = BugzillaClient::builder()
//!     .base_url("https://bugzilla.example.com")
//!     .api_key("your-api-key")
//!     .build()?;
//!
//! let bug = client.bugs().get(12345).await?;
//! println!("{}", bug["summary"]);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use api::{BugSummary, CommentCreated, NewComment, QuickSearch};
pub use client::{BugzillaClient, BugzillaClientBuilder};
pub use config::{AuthScheme, ClientConfig, Idempotency, RetryPolicy};
pub use error::{BugzillaError, BugzillaResult};
