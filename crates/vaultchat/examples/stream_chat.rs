use anyhow::Result;
use futures::StreamExt;
use std::io::Write;
use tracing_subscriber::EnvFilter;
use vaultchat::{
    CallOptions, ChatClient, ChatMessage, Chunk, ClientConfig, RequestOptions, StreamChunk,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Reads VAULTCHAT_BASE_URL, VAULTCHAT_API_KEY, ...
    let config = ClientConfig::from_env()?;
    let client = ChatClient::new(config)?;

    let vault_id = std::env::var("VAULTCHAT_VAULT_ID").unwrap_or_else(|_| "demo".to_string());
    let options = RequestOptions::new(
        vault_id,
        vec![ChatMessage::user("What can you do with my vault?")],
    );

    let mut stream = client.stream(options, CallOptions::default())?;
    let mut stdout = std::io::stdout();

    while let Some(chunk) = stream.next().await {
        match chunk? {
            Chunk::Event(StreamChunk::Text(text)) => {
                print!("{}", text);
                stdout.flush()?;
            }
            Chunk::Event(StreamChunk::ToolCall(call)) => {
                println!("\n[tool call] {} {}", call.tool_name, call.args);
            }
            Chunk::Event(StreamChunk::ToolResult(result)) => {
                println!("[tool result] {} {}", result.tool_call_id, result.result);
            }
            Chunk::Event(StreamChunk::Finish(finish)) => {
                println!("\n[finish] {}", finish.reason);
                if let Some(usage) = finish.usage {
                    println!("Total tokens: {:?}", usage.total());
                }
            }
            Chunk::Event(StreamChunk::Error(message)) => {
                eprintln!("\n[error] {}", message);
            }
            _ => {}
        }
    }

    Ok(())
}
