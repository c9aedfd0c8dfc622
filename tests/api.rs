use pretty_assertions::assert_eq;
use serde_json::json;
use sonicpi_chat::{BackendClient, Message};
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn setup() -> (MockServer, BackendClient) {
    let mock_server = MockServer::start().await;
    let client = BackendClient::new(&mock_server.uri());
    (mock_server, client)
}

#[tokio::test]
async fn test_chat_history_bare_list() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/chat-history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "content": "play a beat", "isUser": true },
            { "content": "Code executed successfully:\n```\nsample :bd_haus\n```", "isUser": false },
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let messages = client.chat_history().await.unwrap();
    assert_eq!(
        messages,
        vec![
            Message::user("play a beat"),
            Message::assistant("Code executed successfully:\n```\nsample :bd_haus\n```"),
        ]
    );
}

#[tokio::test]
async fn test_chat_history_wrapped() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/chat-history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{ "content": "hi", "isUser": true }]
        })))
        .mount(&mock_server)
        .await;

    assert_eq!(client.chat_history().await.unwrap(), vec![Message::user("hi")]);
}

#[tokio::test]
async fn test_chat_history_not_json_is_error() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/chat-history"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    assert!(client.chat_history().await.is_err());
}

#[tokio::test]
async fn test_send_message_posts_json() {
    let (mock_server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/send-message"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "message": "make it jazzy" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Information: try :piano"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let reply = client.send_message("make it jazzy").await.unwrap();
    assert_eq!(reply, "Information: try :piano");
}

#[tokio::test]
async fn test_send_message_server_error() {
    let (mock_server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/send-message"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let err = client.send_message("hi").await.unwrap_err();
    assert!(err.to_string().contains("500"), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_new_chat_and_stop_ignore_body() {
    let (mock_server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/new-chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "New chat started" })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/stop-music"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    client.new_chat().await.unwrap();
    client.stop_music().await.unwrap();
}

#[tokio::test]
async fn test_stop_music_failure() {
    let (mock_server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/stop-music"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    assert!(client.stop_music().await.is_err());
}

#[tokio::test]
async fn test_save_code_returns_message() {
    let (mock_server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/save-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Code saved to /home/me/saved/2.pi"
        })))
        .mount(&mock_server)
        .await;

    assert_eq!(client.save_code().await.unwrap(), "Code saved to /home/me/saved/2.pi");
}

#[tokio::test]
async fn test_unreachable_backend_is_error() {
    // Port 9 (discard) is not served here
    let client = BackendClient::new("http://127.0.0.1:9");
    assert!(client.chat_history().await.is_err());
    assert!(client.save_code().await.is_err());
}
