//! Basic example: a client that retries on server errors and logs every attempt.
//!
//! This example shows how to:
//! - Create a client with a base URL and retry delay
//! - Plug in a custom log sink
//! - Make GET and POST requests and decode the responses
//!
//! Run with: `cargo run --example basic_call`

use reattempt::logger::{Direction, LogEntry};
use reattempt::{Client, Error, ResponseRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("reattempt=debug,basic_call=info")
        .init();

    let client = Client::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .retry_time_millis(500)
        .retry_predicate(|r: &ResponseRecord| r.status.map_or(true, |s| s.is_server_error()))
        .log_sink(|entry: &LogEntry, direction: Direction| {
            println!(
                "[{}] {} -> {:?}",
                direction, entry.request.url, entry.status
            );
        })
        .build()?;

    println!("=== GET Request Example ===");
    let response = client.get("/posts/1").await?;
    let post: Post = response.json()?;

    println!("Post ID: {}", post.id);
    println!("Title: {}", post.title);
    println!("Status code: {:?}", response.status);
    println!("Attempts: {}", response.attempts);
    println!();

    println!("=== POST Request Example ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };

    let response = client.post("/posts", &new_post).await?;
    let created: Post = response.json()?;

    println!("Created post ID: {}", created.id);
    println!("Content-Type: {:?}", response.header("content-type"));
    println!("Was retried: {}", response.was_retried());

    Ok(())
}
