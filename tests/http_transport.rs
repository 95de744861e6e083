//! Real `HttpTransport` against mockito servers, checking the wire formats end to end.

use mockito::{Matcher, Server};
use quill_ai::{Error, Settings, StoryClient, TemperaturePreset};
use serde_json::json;

const KEY: &str = "sk-test-0123456789abcdef";

#[tokio::test]
async fn openai_chat_completion_round_trip() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", format!("Bearer {}", KEY).as_str())
        .match_header("x-quill-request-id", Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "Name a smuggler"}],
            "temperature": 0.3,
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"choices": [{"message": {"role": "assistant", "content": "Mara Vell"}}]})
                .to_string(),
        )
        .create_async()
        .await;

    let client = StoryClient::builder()
        .settings(Settings::new().with_api_key("openai", KEY))
        .base_url_override("openai", server.url())
        .build()
        .unwrap();

    let result = client
        .request("Name a smuggler", TemperaturePreset::Analytical)
        .await
        .unwrap();
    assert_eq!(result.raw_text, "Mara Vell");
    assert_eq!(result.provider_used, "openai");
    mock.assert_async().await;
}

#[tokio::test]
async fn anthropic_error_envelope_fails_over_to_gemini() {
    let mut server = Server::new_async().await;
    let anthropic = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", KEY)
        .match_header("anthropic-version", "2023-06-01")
        .with_status(529)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}})
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let gemini = server
        .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), KEY.into()))
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": {"temperature": 0.8}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"candidates": [{"content": {"parts": [{"text": "from gemini"}]}}]})
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let settings = Settings::new()
        .with_default_provider("anthropic")
        .with_api_key("anthropic", KEY)
        .with_api_key("gemini", KEY);
    let client = StoryClient::builder()
        .settings(settings)
        .base_url_override("anthropic", server.url())
        .base_url_override("gemini", server.url())
        .build()
        .unwrap();

    let result = client
        .request("Describe the harbour", TemperaturePreset::Creative)
        .await
        .unwrap();
    assert_eq!(result.raw_text, "from gemini");
    assert_eq!(result.provider_used, "gemini");
    assert_eq!(client.circuit_snapshot("anthropic").consecutive_failures, 1);
    anthropic.assert_async().await;
    gemini.assert_async().await;
}

#[tokio::test]
async fn last_provider_error_surfaces_when_all_fail() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(json!({"error": {"message": "Incorrect API key provided"}}).to_string())
        .create_async()
        .await;

    let client = StoryClient::builder()
        .settings(Settings::new().with_api_key("openai", KEY))
        .base_url_override("openai", server.url())
        .build()
        .unwrap();

    let err = client
        .request("hi", TemperaturePreset::Creative)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "openai API error (HTTP 401): Incorrect API key provided"
    );
}

#[tokio::test]
async fn connection_failure_is_a_transport_error() {
    let client = StoryClient::builder()
        .settings(Settings::new().with_api_key("openai", KEY))
        .base_url_override("openai", "http://127.0.0.1:1")
        .build()
        .unwrap();

    let err = client
        .request("hi", TemperaturePreset::Creative)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(err.is_provider_failure());
    assert_eq!(client.circuit_snapshot("openai").consecutive_failures, 1);
}

#[test]
fn unknown_override_is_a_configuration_error() {
    let err = StoryClient::builder()
        .base_url_override("mistral", "http://127.0.0.1:1")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}

/// Serve one request on a raw socket and hand back its header block.
async fn capture_one_request(listener: tokio::net::TcpListener, reply: String) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let (mut socket, _) = listener.accept().await.unwrap();
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers were complete");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|l| {
            let (name, value) = l.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        reply.len(),
        reply
    );
    socket.write_all(response.as_bytes()).await.unwrap();
    socket.shutdown().await.ok();
    head
}

#[tokio::test]
async fn requests_carry_a_single_content_type_header() {
    use quill_ai::config::HttpSettings;
    use quill_ai::drivers::{OpenAiDriver, ProviderDriver};
    use quill_ai::transport::{HttpTransport, Transport};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let reply = json!({"choices": [{"message": {"content": "ok"}}]}).to_string();
    let server = tokio::spawn(capture_one_request(listener, reply));

    let driver = OpenAiDriver::new("openai").with_base_url(format!("http://{}", addr));
    let mut request = driver
        .build_request("gpt-4o-mini", "hi", 0.8, 64, KEY)
        .unwrap();
    // A driver that still names the header must not produce a duplicate.
    request
        .headers
        .insert("Content-Type".into(), "application/json".into());

    let transport = HttpTransport::new(&HttpSettings::default()).unwrap();
    let response = transport.send(&request).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(driver.extract_text(response.status, &response.body).unwrap(), "ok");

    let head = server.await.unwrap();
    let content_types: Vec<&str> = head
        .lines()
        .filter(|l| {
            l.split_once(':')
                .map(|(name, _)| name.eq_ignore_ascii_case("content-type"))
                .unwrap_or(false)
        })
        .collect();
    assert_eq!(content_types.len(), 1, "request head:\n{head}");
    assert!(content_types[0].to_ascii_lowercase().contains("application/json"));
}
