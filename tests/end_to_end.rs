//! End-to-end tests: HTTP body in, text and code blocks out.
//!
//! The live test talks to a real server and is `#[ignore]` by default:
//! ```bash
//! OPEN_WEB_API_GENERATE_URL=http://localhost:11434/api/generate \
//!   cargo test --test end_to_end -- --ignored
//! ```

use bytes::Bytes;
use ollama_stream::{
    CodeBlock, DelimiterScanner, StreamCoordinator, StreamHandlers, process_stream,
};
use ollama_stream_client::{Dsn, GenerateRequest, OllamaClient};
use tokio_util::io::StreamReader;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn event_line(response: &str, done: bool) -> String {
    let mut line = serde_json::json!({
        "model": "llama3.2:3b",
        "created_at": "2024-08-04T19:22:45.499127Z",
        "response": response,
        "done": done,
    })
    .to_string();
    line.push('\n');
    line
}

fn answer_body() -> String {
    [
        event_line("Run this:\n``", false),
        event_line("`rust\nfn main() {\n", false),
        event_line("    println!(\"hi\");\n}\n", false),
        event_line("```\nthen ", false),
        event_line("this:\n```sh\ncargo run\n```", false),
        event_line("", true),
    ]
    .concat()
}

/// Split `body` into chunks of `size` bytes, ignoring line boundaries.
fn chunked(body: &str, size: usize) -> Vec<Result<Bytes, std::io::Error>> {
    body.as_bytes()
        .chunks(size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect()
}

fn expected_blocks() -> Vec<CodeBlock> {
    vec![
        CodeBlock::new("rust", "fn main() {\n    println!(\"hi\");\n}\n"),
        CodeBlock::new("sh", "cargo run\n"),
    ]
}

#[tokio::test]
async fn chunked_body_yields_same_text_and_blocks() {
    for size in [1, 3, 7, 64, 4096] {
        let reader = StreamReader::new(futures::stream::iter(chunked(&answer_body(), size)));

        let mut text = String::new();
        let mut blocks = Vec::new();
        let mut handlers = StreamHandlers::new()
            .on_event(|event| {
                text.push_str(event.fragment().unwrap_or_default());
                Ok(())
            })
            .on_code_blocks(|batch| {
                blocks.extend(batch);
                Ok(())
            });
        let summary = process_stream(reader, &mut handlers)
            .await
            .expect("stream succeeds");
        drop(handlers);

        assert_eq!(summary.events, 6, "chunk size {size}");
        assert!(summary.completed);
        assert!(text.starts_with("Run this:\n```rust\n"));
        assert_eq!(blocks, expected_blocks(), "chunk size {size}");
    }
}

#[tokio::test]
async fn coordinator_keeps_unclosed_text_pending() {
    let body = [event_line("intro\n```py\nprint(1)\n", false), event_line("", true)].concat();
    let reader = StreamReader::new(futures::stream::iter(chunked(&body, 5)));
    let mut scanner = DelimiterScanner::ndjson(reader);

    let mut handlers = StreamHandlers::new().on_code_blocks(|_| Ok(()));
    let mut coordinator = StreamCoordinator::new();
    while let Some(token) = scanner.next_token().await {
        let token = token.expect("read succeeds");
        coordinator
            .handle_token(&token, &mut handlers)
            .expect("dispatch succeeds");
    }

    assert_eq!(coordinator.summary().code_blocks, 0);
    assert!(coordinator.summary().completed);
    assert_eq!(coordinator.pending_text(), "intro\n```py\nprint(1)\n");
}

#[tokio::test]
async fn client_delivers_blocks_from_mock_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(answer_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(Dsn::new(format!("{}/api/generate", server.uri()), ""));
    let mut batches = Vec::new();
    let mut handlers = StreamHandlers::new().on_code_blocks(|batch| {
        batches.push(batch);
        Ok(())
    });
    let summary = client
        .query(GenerateRequest::new("llama3.2:3b", "hello"), &mut handlers)
        .await
        .expect("query succeeds");
    drop(handlers);

    assert_eq!(summary.code_blocks, 2);
    assert_eq!(batches.len(), 2);
    assert_eq!(batches.concat(), expected_blocks());
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn live_query_completes() {
    let client = OllamaClient::new(Dsn::from_env().expect("OPEN_WEB_API_GENERATE_URL set"));
    let mut text = String::new();
    let mut handlers = StreamHandlers::new().on_event(|event| {
        text.push_str(event.fragment().unwrap_or_default());
        Ok(())
    });
    let summary = client
        .query(
            GenerateRequest::new("llama3.2:3b", "Reply with the single word: pong"),
            &mut handlers,
        )
        .await
        .expect("query succeeds");
    drop(handlers);

    assert!(summary.completed);
    assert!(!text.is_empty());
}
