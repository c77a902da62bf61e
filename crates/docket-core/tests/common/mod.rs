#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use docket_core::engine::{BackendError, ExecutionBackend, ExecutionRequest};

/// What the scripted backend does for a given piece of code.
#[derive(Debug, Clone)]
pub enum Reply {
    Output(String),
    Compile(String),
    Runtime(String),
    Hang,
}

/// Backend answering from a table keyed by example code.
///
/// Unknown code echoes back as its own output. Every call is recorded as a
/// `start <id>` event, and every completed call as `end <id>`.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: HashMap<String, Reply>,
    events: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, code: &str, reply: Reply) -> Self {
        self.replies.insert(code.to_string(), reply);
        self
    }

    pub fn output(self, code: &str, output: &str) -> Self {
        self.reply(code, Reply::Output(output.to_string()))
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Test ids in the order they reached the backend.
    pub fn calls(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| e.strip_prefix("start ").map(str::to_string))
            .collect()
    }

    fn record(&self, event: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[async_trait]
impl ExecutionBackend for ScriptedBackend {
    async fn execute(&self, request: &ExecutionRequest) -> Result<String, BackendError> {
        self.record(format!("start {}", request.test_id));
        tokio::task::yield_now().await;

        let reply = match self.replies.get(&request.code) {
            Some(Reply::Output(out)) => Ok(out.clone()),
            Some(Reply::Compile(msg)) => Err(BackendError::Compile(msg.clone())),
            Some(Reply::Runtime(msg)) => Err(BackendError::Runtime(msg.clone())),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
            None => Ok(request.code.clone()),
        };

        self.record(format!("end {}", request.test_id));
        reply
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Two source units used across the suites.
pub const MATH_CPP: &str = "#include \"math.hpp\"

int add(int a, int b);
/// >>> add(2, 3)
/// 5

int sub(int a, int b);
/// >>> sub(5, 3)
/// 2
/// >>> sub(1, 1)
/// 0

int mul(int a, int b);
";

pub const UTIL_CPP: &str = "namespace util {

int twice(int x);
/// >>> twice(4)
/// 8

}
";
