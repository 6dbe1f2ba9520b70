//! Sign-then-broadcast for a transaction the node has already encoded.

use chain_rtm::PreviousOutputDescriptor;
use node_rpc::{BroadcastOptions, NodeApi, RpcClient};
use secrecy::{ExposeSecret, SecretString};

use crate::error::WalletError;

/// Sign `unsigned_hex` with `wif` and broadcast it, returning the txid the
/// node reports.
///
/// An incomplete signature fails with [`WalletError::IncompleteSignature`]
/// before anything is broadcast. Nothing is retried.
pub async fn submit<C>(
    client: &C,
    unsigned_hex: &str,
    previous_outputs: &[PreviousOutputDescriptor],
    wif: &SecretString,
    options: Option<BroadcastOptions>,
) -> Result<String, WalletError>
where
    C: RpcClient + ?Sized,
{
    let signed = client
        .sign_raw_transaction_with_key(unsigned_hex, wif.expose_secret(), previous_outputs)
        .await?;

    if !signed.complete {
        log::warn!(
            "signer left {} of {} inputs unsigned",
            signed.errors.len(),
            previous_outputs.len()
        );
        return Err(WalletError::IncompleteSignature {
            errors: signed.errors,
        });
    }

    let txid = client.send_raw_transaction(&signed.hex, options).await?;
    log::info!("broadcast transaction {txid}");
    Ok(txid)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use node_rpc::{Method, RpcError};
    use serde_json::{json, Value};

    use super::*;

    struct Script {
        replies: Mutex<VecDeque<Value>>,
        seen: Mutex<Vec<(Method, Vec<Value>)>>,
    }

    impl Script {
        fn new(replies: Vec<Value>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn methods(&self) -> Vec<Method> {
            self.seen.lock().unwrap().iter().map(|(m, _)| *m).collect()
        }
    }

    #[async_trait]
    impl RpcClient for Script {
        async fn call(&self, method: Method, params: Vec<Value>) -> Result<Value, RpcError> {
            self.seen.lock().unwrap().push((method, params));
            Ok(self.replies.lock().unwrap().pop_front().unwrap_or(Value::Null))
        }
    }

    fn prev() -> Vec<PreviousOutputDescriptor> {
        vec![PreviousOutputDescriptor {
            txid: "a".repeat(64),
            vout: 0,
            script_pub_key: "76a914".into(),
            amount_sat: 100_000,
        }]
    }

    #[tokio::test]
    async fn signs_then_broadcasts() {
        let node = Script::new(vec![
            json!({ "hex": "0200signed", "complete": true }),
            json!("f00d"),
        ]);
        let wif = SecretString::from("cWALDjUu1tszsCBMjBjL4mhtjHDZMS5U52WHJ29iqqspawkaatBD");

        let txid = submit(&node, "0200", &prev(), &wif, None).await.unwrap();
        assert_eq!(txid, "f00d");
        assert_eq!(
            node.methods(),
            [Method::SignRawTransactionWithKey, Method::SendRawTransaction]
        );

        let seen = node.seen.lock().unwrap();
        assert_eq!(seen[0].1[1], json!([wif.expose_secret()]));
        assert_eq!(seen[0].1[2][0]["amount"], json!(0.001));
        assert_eq!(seen[1].1, vec![json!("0200signed")]);
    }

    #[tokio::test]
    async fn incomplete_signature_stops_before_broadcast() {
        let node = Script::new(vec![json!({
            "hex": "0200",
            "complete": false,
            "errors": [{ "txid": "a", "vout": 0, "scriptSig": "", "sequence": 0, "error": "Unable to sign input" }]
        })]);
        let wif = SecretString::from("key");

        let err = submit(&node, "0200", &prev(), &wif, None).await.unwrap_err();
        match err {
            WalletError::IncompleteSignature { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].error, "Unable to sign input");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(node.methods(), [Method::SignRawTransactionWithKey]);
    }
}
