//! URL-routed scripted transport

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tftstat_collector::client::{HttpTransport, RawResponse, TransportFailure};

/// Scripted reply for one request
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    Fail(String),
    /// Reply after a delay
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    pub fn ok(body: serde_json::Value) -> Self {
        Reply::Status(200, body.to_string())
    }

    pub fn status(status: u16) -> Self {
        Reply::Status(status, "{}".to_string())
    }

    pub fn fail() -> Self {
        Reply::Fail("connection reset".to_string())
    }

    pub fn delayed(self, delay: Duration) -> Self {
        Reply::Delayed(delay, Box::new(self))
    }
}

/// Replies by exact URL; each route plays its replies in order and repeats
/// the last one. Unrouted URLs answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, Vec<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: impl Into<String>, replies: Vec<Reply>) -> Self {
        self.routes.lock().unwrap().insert(url.into(), replies);
        self
    }

    pub fn add_route(&self, url: impl Into<String>, replies: Vec<Reply>) {
        self.routes.lock().unwrap().insert(url.into(), replies);
    }

    /// Every URL requested so far, in dispatch order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn calls_matching(&self, fragment: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.contains(fragment))
            .count()
    }

    fn next_reply(&self, url: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(replies) if replies.len() > 1 => replies.remove(0),
            Some(replies) if replies.len() == 1 => replies[0].clone(),
            _ => Reply::status(404),
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, _api_key: &str) -> Result<RawResponse, TransportFailure> {
        self.calls.lock().unwrap().push(url.to_string());
        let mut reply = self.next_reply(url);

        loop {
            match reply {
                Reply::Status(status, body) => return Ok(RawResponse::new(status, body)),
                Reply::Fail(message) => return Err(TransportFailure(message)),
                Reply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }
}
