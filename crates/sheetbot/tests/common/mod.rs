//! Shared harness: the real feature tree over in-memory sheets, a recording
//! sender and a canned bus source.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sheetbot::features::bus::{BusArrivalSource, ServiceArrival};
use sheetbot::{build_tree, BotApp, FeatureDeps, InboundUpdate};
use sheetcore::testing::RecordingSender;
use sheetcore::{AppResult, ChatUser, CommandStateStore, MemoryBackend, Reply, SheetBackend};

/// Answers every stop with service 15 arriving in ten minutes.
#[derive(Default)]
pub struct FakeBuses {
    pub requested: Mutex<Vec<String>>,
}

#[async_trait]
impl BusArrivalSource for FakeBuses {
    async fn arrivals(&self, stop_code: &str) -> AppResult<Vec<ServiceArrival>> {
        self.requested.lock().unwrap().push(stop_code.to_string());
        let eta = (Utc::now() + Duration::minutes(10)).fixed_offset();
        Ok(vec![ServiceArrival {
            service_no: "15".to_string(),
            arrivals: vec![eta],
        }])
    }
}

pub struct Harness {
    pub app: BotApp,
    pub sender: Arc<RecordingSender>,
    pub buses: Arc<FakeBuses>,
    pub states: CommandStateStore,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_words(vec!["crane".to_string()])
    }

    pub fn with_words(words: Vec<String>) -> Self {
        let backend: Arc<dyn SheetBackend> = Arc::new(MemoryBackend::new());
        let buses = Arc::new(FakeBuses::default());
        let deps = FeatureDeps::new(backend.clone(), buses.clone()).with_words(words);
        let tree = Arc::new(build_tree(deps).unwrap());
        let sender = Arc::new(RecordingSender::new());
        let app = BotApp::new(tree, backend.clone(), sender.clone());
        Self {
            app,
            sender,
            buses,
            states: CommandStateStore::new(backend),
        }
    }

    /// Sends `text` as a private message from `user` and returns the replies.
    pub async fn send(&self, user: &ChatUser, text: &str) -> Vec<(i64, Reply)> {
        let update = InboundUpdate::Message {
            chat_id: user.id,
            text: text.to_string(),
            from: Some(user.clone()),
        };
        self.app.handle_update(update).await.unwrap();
        self.sender.take()
    }

    /// Presses a button carrying `data`.
    pub async fn press(&self, user: &ChatUser, data: &str) -> Vec<(i64, Reply)> {
        let update = InboundUpdate::Callback {
            data: data.to_string(),
            from: user.clone(),
            chat_id: user.id,
        };
        self.app.handle_update(update).await.unwrap();
        self.sender.take()
    }

    pub fn state(&self, user: &ChatUser) -> Option<String> {
        self.states.get(user.id).unwrap()
    }
}

pub fn ann() -> ChatUser {
    let mut user = ChatUser::new(1, "Ann");
    user.username = Some("ann_k".to_string());
    user
}

pub fn bob() -> ChatUser {
    ChatUser::new(2, "Bob")
}

pub fn last_text(replies: &[(i64, Reply)]) -> &str {
    replies.last().map(|(_, r)| r.text.as_str()).unwrap_or_default()
}
