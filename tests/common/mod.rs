//! Recording fakes for the search bot's service seams

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId, UserId};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use pinsearch::bot::ui_builder::PhotoReply;
use pinsearch::bot::{ChatApi, SearchBot, SearchSettings, UserContext};
use pinsearch::errors::{SearchError, TaggerError};
use pinsearch::pinterest::{PinSearch, SearchResult};
use pinsearch::subscription::SubscriptionGate;
use pinsearch::tagger::ImageTagger;

pub const USER: UserId = UserId(42);
pub const CHAT: ChatId = ChatId(4242);
pub const CHANNEL: &str = "@pins_channel";

#[derive(Debug, Clone, PartialEq)]
pub enum ChatCall {
    SendText { chat_id: ChatId, text: String },
    EditText { chat_id: ChatId, message_id: MessageId, text: String },
    EditCaption { chat_id: ChatId, message_id: MessageId, caption: String },
    Delete { chat_id: ChatId, message_id: MessageId },
    SendPhoto { chat_id: ChatId, reply: PhotoReply },
    FileUrl { file_id: String },
}

/// Records every outbound call; message ids are handed out from 1.
/// Deleted messages can no longer be edited, as on Telegram.
#[derive(Default)]
pub struct RecordingChat {
    calls: Mutex<Vec<ChatCall>>,
    deleted: Mutex<HashSet<MessageId>>,
    next_id: AtomicI32,
    pub fail_photos: bool,
    pub rejected_images: Vec<String>,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_photos() -> Self {
        Self {
            fail_photos: true,
            ..Self::default()
        }
    }

    /// Rejects only the photos whose image URL is listed
    pub fn rejecting_images(image_urls: &[&str]) -> Self {
        Self {
            rejected_images: image_urls.iter().map(|url| url.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_photos(&self) -> Vec<PhotoReply> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChatCall::SendPhoto { reply, .. } => Some(reply),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ChatCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn ensure_editable(&self, message_id: MessageId) -> Result<()> {
        if self.deleted.lock().unwrap().contains(&message_id) {
            return Err(anyhow!("Bad Request: message to edit not found"));
        }
        Ok(())
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl ChatApi for RecordingChat {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageId> {
        self.record(ChatCall::SendText {
            chat_id,
            text: text.to_string(),
        });
        Ok(self.next_message_id())
    }

    async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()> {
        self.record(ChatCall::EditText {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        self.ensure_editable(message_id)
    }

    async fn edit_caption(&self, chat_id: ChatId, message_id: MessageId, caption: &str) -> Result<()> {
        self.record(ChatCall::EditCaption {
            chat_id,
            message_id,
            caption: caption.to_string(),
        });
        self.ensure_editable(message_id)
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.record(ChatCall::Delete { chat_id, message_id });
        if !self.deleted.lock().unwrap().insert(message_id) {
            return Err(anyhow!("Bad Request: message to delete not found"));
        }
        Ok(())
    }

    async fn send_photo(&self, chat_id: ChatId, reply: &PhotoReply) -> Result<MessageId> {
        self.record(ChatCall::SendPhoto {
            chat_id,
            reply: reply.clone(),
        });
        if self.fail_photos || self.rejected_images.contains(&reply.image_url) {
            return Err(anyhow!("Bad Request: wrong file identifier/HTTP URL specified"));
        }
        Ok(self.next_message_id())
    }

    async fn file_url(&self, file_id: &str) -> Result<String> {
        self.record(ChatCall::FileUrl {
            file_id: file_id.to_string(),
        });
        Ok(format!("https://api.telegram.org/file/botTOKEN/photos/{file_id}.jpg"))
    }
}

/// Returns canned results, or fails when `results` is `None`
pub struct FakeSearch {
    results: Option<Vec<SearchResult>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl FakeSearch {
    pub fn returning(results: Vec<SearchResult>) -> Self {
        Self {
            results: Some(results),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            results: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PinSearch for FakeSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        self.calls.lock().unwrap().push((query.to_string(), max_results));
        match &self.results {
            Some(results) => Ok(results.iter().take(max_results).cloned().collect()),
            None => Err(SearchError::UnexpectedShape("data is a list".to_string())),
        }
    }
}

/// Returns a fixed description, or fails when `description` is `None`
pub struct FakeTagger {
    description: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeTagger {
    pub fn describing(description: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            description: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageTagger for FakeTagger {
    async fn describe(&self, image_url: &str) -> Result<String, TaggerError> {
        self.calls.lock().unwrap().push(image_url.to_string());
        self.description.clone().ok_or(TaggerError::NoConcepts)
    }
}

pub struct StaticGate(pub bool);

#[async_trait]
impl SubscriptionGate for StaticGate {
    async fn is_subscribed(&self, _user_id: UserId) -> bool {
        self.0
    }
}

pub fn pin(n: usize) -> SearchResult {
    SearchResult {
        image_url: format!("https://i.pinimg.com/originals/{n}.jpg"),
        title: format!("Pin {n}"),
        link: format!("https://example.com/pin/{n}"),
    }
}

pub fn pins(count: usize) -> Vec<SearchResult> {
    (0..count).map(pin).collect()
}

pub fn english_user() -> UserContext {
    UserContext {
        user_id: USER,
        chat_id: CHAT,
        language_code: Some("en".to_string()),
    }
}

pub fn build_bot(
    chat: &Arc<RecordingChat>,
    search: &Arc<FakeSearch>,
    tagger: &Arc<FakeTagger>,
    subscribed: bool,
) -> SearchBot {
    SearchBot::new(
        chat.clone(),
        search.clone(),
        tagger.clone(),
        Arc::new(StaticGate(subscribed)),
        SearchSettings {
            max_results: 10,
            show_more_count: 5,
            channel_id: CHANNEL.to_string(),
        },
    )
}

/// Serve one canned HTTP response on 127.0.0.1.
///
/// Returns the URL to call and a handle resolving to the raw request the
/// server received.
pub async fn serve_once(status: u16, content_type: &str, body: &str) -> Result<(String, JoinHandle<Result<String>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let reason = if status == 200 { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await?;
        let request = read_request(&mut socket).await?;
        socket.write_all(response.as_bytes()).await?;
        socket.shutdown().await?;
        Ok(request)
    });

    Ok((format!("http://{addr}/resource"), handle))
}

/// Read headers and, when announced, a content-length body
async fn read_request(socket: &mut TcpStream) -> Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Request line, lowercased header block and body of a raw request
pub fn split_request(raw: &str) -> (String, String, String) {
    let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
    let (line, headers) = head.split_once("\r\n").unwrap_or((head, ""));
    (line.to_string(), headers.to_lowercase(), body.to_string())
}
