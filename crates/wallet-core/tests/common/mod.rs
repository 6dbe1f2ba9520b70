//! Scripted in-memory node for driving the wallet without a network.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use node_rpc::{Method, RpcClient, RpcError};
use serde_json::{json, Value};

/// Mainnet address of private key 1 (compressed).
pub const SOURCE: &str = "RKxTdfmtxtfLDKZBgx6SvNkBtNu9jRYnLh";
pub const SOURCE_WIF: &str = "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn";
/// Mainnet address of private key 1 (uncompressed).
pub const DEST: &str = "RNZZecHLuoqUzNc9oE8ErkPFV1zJdvDBAH";

#[derive(Clone)]
enum Reply {
    Ok(Value),
    Fail { code: i64, message: String },
}

/// Answers each method from its own queue. The last reply queued for a
/// method is repeated once the queue is down to it.
#[derive(Default)]
pub struct ScriptedNode {
    replies: Mutex<HashMap<Method, VecDeque<Reply>>>,
    calls: Mutex<Vec<(Method, Vec<Value>)>>,
}

impl ScriptedNode {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self::default()
    }

    pub fn reply(self, method: Method, value: Value) -> Self {
        self.push(method, Reply::Ok(value));
        self
    }

    pub fn fail(self, method: Method, code: i64, message: &str) -> Self {
        self.push(
            method,
            Reply::Fail {
                code,
                message: message.to_string(),
            },
        );
        self
    }

    fn push(&self, method: Method, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<(Method, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<Method> {
        self.calls().into_iter().map(|(m, _)| m).collect()
    }

    /// Params of the first call to `method`.
    pub fn params_of(&self, method: Method) -> Vec<Value> {
        self.calls()
            .into_iter()
            .find(|(m, _)| *m == method)
            .map(|(_, params)| params)
            .unwrap_or_else(|| panic!("{method} was never called"))
    }

    pub fn count(&self, method: Method) -> usize {
        self.methods().iter().filter(|m| **m == method).count()
    }
}

#[async_trait]
impl RpcClient for ScriptedNode {
    async fn call(&self, method: Method, params: Vec<Value>) -> Result<Value, RpcError> {
        self.calls.lock().unwrap().push((method, params));

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            let queue = replies
                .get_mut(&method)
                .unwrap_or_else(|| panic!("no reply scripted for {method}"));
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        };

        match reply {
            Some(Reply::Ok(value)) => Ok(value),
            Some(Reply::Fail { code, message }) => Err(RpcError::Node {
                method,
                code,
                message,
            }),
            None => panic!("no reply scripted for {method}"),
        }
    }
}

pub fn txid(fill: char) -> String {
    fill.to_string().repeat(64)
}

/// Address-index row for a native output.
pub fn native_row(fill: char, vout: u32, satoshis: u64) -> Value {
    json!({
        "address": SOURCE,
        "txid": txid(fill),
        "outputIndex": vout,
        "script": "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac",
        "satoshis": satoshis,
        "height": 100
    })
}

/// Address-index row for an asset output.
pub fn asset_row(fill: char, vout: u32, asset_id: &str, unique_id: Option<u64>) -> Value {
    let mut row = native_row(fill, vout, 0);
    row["assetId"] = json!(asset_id);
    if let Some(id) = unique_id {
        row["uniqueId"] = json!(id);
    }
    row
}
