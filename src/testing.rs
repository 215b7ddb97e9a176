//! In-process fakes for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::channels::ChatSink;
use crate::error::{FetchError, SendError, StoreError};
use crate::model::Post;
use crate::source::PostSource;
use crate::store::WatermarkStore;

pub fn post(id: &str) -> Post {
    Post::new(id, format!("/r/test/comments/{id}/"))
}

pub fn page(ids: &[&str]) -> Vec<Post> {
    ids.iter().map(|id| post(id)).collect()
}

/// Replays queued fetch results; once the script runs out it keeps
/// returning the last successful page.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Vec<Post>, FetchError>>>,
    last_page: Mutex<Vec<Post>>,
    pub calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, ids: &[&str]) -> &Self {
        self.script.lock().unwrap().push_back(Ok(page(ids)));
        self
    }

    pub fn push_error(&self) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(FetchError::Status {
                source_name: "r/test".into(),
                status: 503,
                body: "unavailable".into(),
            }));
        self
    }
}

#[async_trait]
impl PostSource for ScriptedSource {
    async fn fetch_newest(&self, _source: &str, limit: usize) -> Result<Vec<Post>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(mut posts)) => {
                posts.truncate(limit);
                *self.last_page.lock().unwrap() = posts.clone();
                Ok(posts)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last_page.lock().unwrap().clone()),
        }
    }
}

/// HashMap-backed store with switchable failures.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
    pub fail_get: AtomicBool,
    pub fail_put: AtomicBool,
    pub puts: AtomicUsize,
    pub closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_watermark(source: &str, id: &str) -> Self {
        let store = Self::default();
        store
            .map
            .lock()
            .unwrap()
            .insert(source.to_string(), id.to_string());
        store
    }

    pub fn watermark(&self, source: &str) -> Option<String> {
        self.map.lock().unwrap().get(source).cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WatermarkStore for MemoryStore {
    async fn get(&self, source: &str) -> Result<Option<String>, StoreError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(StoreError::Query("injected get failure".into()));
        }
        Ok(self.watermark(source))
    }

    async fn put(&self, source: &str, id: &str) -> Result<(), StoreError> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(StoreError::Query("injected put failure".into()));
        }
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.map
            .lock()
            .unwrap()
            .insert(source.to_string(), id.to_string());
        Ok(())
    }
    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Records every message; the first `fail_first` sends are rejected.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(i64, String)>>,
    pub fail_first: AtomicUsize,
    pub attempts: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(n: usize) -> Self {
        let sink = Self::default();
        sink.fail_first.store(n, Ordering::SeqCst);
        sink
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn chat_ids(&self) -> Vec<i64> {
        self.sent.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }
}

#[async_trait]
impl ChatSink for RecordingSink {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_first.store(remaining - 1, Ordering::SeqCst);
            return Err(SendError::Rejected {
                status: 400,
                description: "Bad Request: chat not found".into(),
            });
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}
