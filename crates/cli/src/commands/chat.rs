//! `kbdesk chat` - Interactive or single-message chat client.
//!
//! The client owns the conversation. Each turn it fetches the current
//! knowledge list, posts it with the full history to `/api/chat`, and
//! records the exchange only if the call succeeded.

use kbdesk_core::knowledge::{KnowledgeEntry, NewKnowledge};
use kbdesk_core::session::ChatSession;
use kbdesk_gateway::api::{ChatRequest, ChatResponse, ErrorResponse};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// HTTP client for a running gateway.
pub struct ChatClient {
    base_url: String,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Turn a non-success response into the gateway's error message.
    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) => err.error,
            Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
            Err(_) => format!("HTTP {status}: {body}"),
        }
    }

    pub async fn knowledge(&self) -> Result<Vec<KnowledgeEntry>, String> {
        let response = self
            .http
            .get(format!("{}/api/knowledge", self.base_url))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(Self::error_message(response).await);
        }
        response.json().await.map_err(|e| e.to_string())
    }

    /// One chat turn against a fresh knowledge snapshot.
    pub async fn send(&self, session: &ChatSession, message: &str) -> Result<ChatResponse, String> {
        let snapshot: Vec<NewKnowledge> = self
            .knowledge()
            .await?
            .into_iter()
            .map(|e| NewKnowledge::new(e.question, e.answer))
            .collect();

        let request = ChatRequest {
            message: message.to_string(),
            history: session.history().to_vec(),
            knowledge: Some(snapshot),
        };

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(Self::error_message(response).await);
        }
        response.json().await.map_err(|e| e.to_string())
    }
}

/// Send one message and render the assistant's side of the exchange.
///
/// Successful exchanges are appended to the session; failures are rendered
/// inline and leave the session untouched.
pub async fn exchange(client: &ChatClient, session: &mut ChatSession, message: &str) -> String {
    match client.send(session, message).await {
        Ok(reply) => {
            session.record_exchange(message, reply.text.clone());
            reply.text
        }
        Err(e) => format!("⚠️ Error: {e}"),
    }
}

pub async fn run(
    server: String,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = ChatClient::new(&server)?;
    let mut session = ChatSession::new();

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let rendered = exchange(&client, &mut session, &msg).await;
        eprint!("\r              \r");
        println!("{rendered}");
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║         kbdesk — Support Chat                ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Server:  {server}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        let rendered = exchange(&client, &mut session, line).await;
        eprint!("\r     \r");
        println!("\n  Assistant > {}\n", rendered.replace('\n', "\n              "));
    }

    println!("  👋 Bye!");
    Ok(())
}
