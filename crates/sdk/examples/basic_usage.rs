//! Basic SDK usage example.
//!
//! Looks up a bug, its public comments and a quicksearch on a Bugzilla
//! instance.
//!
//! Run with:
//! BUGZILLA_SERVER=https://bugzilla.mozilla.org BUGZILLA_API_KEY=... \
//!     cargo run --example basic_usage -- 1800000

use bugzilla_sdk::{BugzillaClient, BugzillaResult, QuickSearch};
use std::time::Duration;

#[tokio::main]
async fn main() -> BugzillaResult<()> {
    tracing_subscriber::fmt::init();

    let server = std::env::var("BUGZILLA_SERVER")
        .unwrap_or_else(|_| "https://bugzilla.mozilla.org".to_string());
    let bug_id: u64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1);

    let mut builder = BugzillaClient::builder()
        .base_url(server)
        .timeout(Duration::from_secs(30));
    if let Ok(key) = std::env::var("BUGZILLA_API_KEY") {
        builder = builder.api_key(key);
    }
    let client = builder.build()?;

    println!("Fetching bug {}...", bug_id);
    let bug = client.bugs().get(bug_id).await?;
    println!("  Summary: {}", bug["summary"]);
    println!("  Status: {} {}", bug["status"], bug["resolution"]);

    let comments = client.bugs().comments(bug_id).await?;
    println!("\nFound {} comments", comments.len());
    for comment in comments.iter().take(3) {
        println!("  {} at {}", comment["creator"], comment["creation_time"]);
    }

    println!("\nSearching open crash bugs...");
    let mut search = QuickSearch::new("crash");
    search.status = Some("OPEN".to_string());
    search.limit = 5;
    for bug in client.bugs().quicksearch(&search).await? {
        println!("  Bug {}: {} [{}]", bug.bug_id, bug.summary, bug.status);
    }

    Ok(())
}
