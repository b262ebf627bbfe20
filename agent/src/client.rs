//! HTTP client for the registry server

use alloy_primitives::{Address, B256, U256};
use anyhow::{Context, Result};
use rand::Rng;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::retry::{is_retryable, RetryPolicy};

const CALLER_HEADER: &str = "X-Caller-Address";

/// Proof payload in the shape the registry expects
#[derive(Debug, Clone, Serialize)]
pub struct ProofPayload {
    pub root: U256,
    pub nullifier_hash: U256,
    pub proof: [U256; 8],
}

impl ProofPayload {
    /// Builds mock proof material for the stub verifier.
    ///
    /// Proof elements are SHA-256 digests of the nullifier so repeated runs with
    /// the same nullifier submit the same proof.
    pub fn mock(owner: Address, root: U256, nullifier_hash: Option<U256>) -> Self {
        let nullifier_hash = nullifier_hash.unwrap_or_else(|| {
            let bytes: [u8; 31] = rand::thread_rng().gen();
            U256::from_be_slice(&bytes)
        });

        let mut proof = [U256::ZERO; 8];
        for (i, element) in proof.iter_mut().enumerate() {
            let mut hasher = Sha256::new();
            hasher.update(owner.as_slice());
            hasher.update(nullifier_hash.to_be_bytes::<32>());
            hasher.update([i as u8]);
            // Keep elements inside the scalar field
            *element = U256::from_be_slice(&hasher.finalize()[1..]);
        }

        Self {
            root,
            nullifier_hash,
            proof,
        }
    }
}

pub struct RegistryClient {
    client: Client,
    server: String,
    caller: Option<Address>,
    retry: RetryPolicy,
}

impl RegistryClient {
    pub fn new(server: &str, caller: Option<Address>, retry: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            server: server.trim_end_matches('/').to_string(),
            caller,
            retry,
        }
    }

    /// Sends a request, retrying transport failures and 5xx answers with backoff.
    async fn call(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}{}", self.server, path);
        let mut attempt = 0;

        loop {
            let mut request = self.client.request(method.clone(), &url);
            if let Some(caller) = self.caller {
                request = request.header(CALLER_HEADER, caller.to_string());
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let retry_reason = match request.send().await {
                Ok(resp) if resp.status().is_success() => {
                    return resp.json().await.context("Invalid JSON response");
                }
                Ok(resp) => {
                    let status = resp.status();
                    let message = resp
                        .json::<Value>()
                        .await
                        .ok()
                        .and_then(|v| v["error"].as_str().map(str::to_string))
                        .unwrap_or_else(|| status.to_string());

                    if !is_retryable(status) || attempt >= self.retry.max_retries {
                        anyhow::bail!("{} {} rejected ({}): {}", method, path, status.as_u16(), message);
                    }
                    format!("{} ({})", message, status.as_u16())
                }
                Err(e) => {
                    if attempt >= self.retry.max_retries {
                        return Err(e).with_context(|| format!("{} {} failed", method, path));
                    }
                    e.to_string()
                }
            };

            let delay = self.retry.delay_for(attempt);
            tracing::warn!(
                "{} {} failed: {}; retry {}/{} in {:?}",
                method,
                path,
                retry_reason,
                attempt + 1,
                self.retry.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    pub async fn health(&self) -> Result<Value> {
        self.call(Method::GET, "/health", None).await
    }

    pub async fn create_registry(&self, owner: Address, ens_domain: &str, owner_nullifier_hash: U256) -> Result<Value> {
        let body = json!({
            "owner": owner,
            "ens_domain": ens_domain,
            "owner_nullifier_hash": owner_nullifier_hash,
        });
        self.call(Method::POST, "/api/v1/registries", Some(&body)).await
    }

    pub async fn registry(&self, handle: Address) -> Result<Value> {
        self.call(Method::GET, &format!("/api/v1/registries/{}", handle), None)
            .await
    }

    pub async fn registry_of_user(&self, user: Address) -> Result<Value> {
        self.call(Method::GET, &format!("/api/v1/registries/by-user/{}", user), None)
            .await
    }

    pub async fn registry_of_domain(&self, domain: &str) -> Result<Value> {
        self.call(Method::GET, &format!("/api/v1/registries/by-domain/{}", domain), None)
            .await
    }

    pub async fn add_device(
        &self,
        handle: Address,
        model: &str,
        device_address: Address,
        device_nullifier: U256,
        proof: &ProofPayload,
    ) -> Result<Value> {
        let body = json!({
            "model": model,
            "device_address": device_address,
            "device_nullifier": device_nullifier,
            "proof": proof,
        });
        self.call(Method::POST, &format!("/api/v1/registries/{}/devices", handle), Some(&body))
            .await
    }

    pub async fn devices(&self, handle: Address) -> Result<Value> {
        self.call(Method::GET, &format!("/api/v1/registries/{}/devices", handle), None)
            .await
    }

    pub async fn device(&self, handle: Address, identity_hash: B256) -> Result<Value> {
        self.call(
            Method::GET,
            &format!("/api/v1/registries/{}/devices/{}", handle, identity_hash),
            None,
        )
        .await
    }

    pub async fn grant(&self, handle: Address, identity_hash: B256, app_id: &str, level: u8) -> Result<Value> {
        let body = json!({ "app_id": app_id, "permission_level": level });
        self.call(
            Method::POST,
            &format!("/api/v1/registries/{}/devices/{}/apps", handle, identity_hash),
            Some(&body),
        )
        .await
    }

    pub async fn update(&self, handle: Address, identity_hash: B256, app_id: &str, level: u8) -> Result<Value> {
        let body = json!({ "permission_level": level });
        self.call(
            Method::PUT,
            &format!("/api/v1/registries/{}/devices/{}/apps/{}", handle, identity_hash, app_id),
            Some(&body),
        )
        .await
    }

    pub async fn apps(&self, handle: Address, identity_hash: B256) -> Result<Value> {
        self.call(
            Method::GET,
            &format!("/api/v1/registries/{}/devices/{}/apps", handle, identity_hash),
            None,
        )
        .await
    }

    pub async fn events(&self, since: usize) -> Result<Value> {
        self.call(Method::GET, &format!("/api/v1/events?since={}", since), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves canned responses in order, repeating the last one.
    async fn canned_server(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 8192];
                let _ = socket.read(&mut buf).await;

                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[n.min(responses.len() - 1)];
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let (url, hits) = canned_server(vec![
            (503, r#"{"error":"busy","code":503}"#),
            (502, r#"{"error":"ens down","code":502}"#),
            (200, r#"{"status":"healthy"}"#),
        ])
        .await;

        let client = RegistryClient::new(&url, None, fast_policy(3));
        let body = client.health().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rejections_are_not_retried() {
        let (url, hits) = canned_server(vec![(409, r#"{"error":"Device already exists","code":409}"#)]).await;

        let client = RegistryClient::new(&url, None, fast_policy(3));
        let err = client.devices(Address::ZERO).await.unwrap_err();
        assert!(err.to_string().contains("Device already exists"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_give_up_after_limit() {
        let (url, hits) = canned_server(vec![(500, r#"{"error":"boom","code":500}"#)]).await;

        let client = RegistryClient::new(&url, None, fast_policy(2));
        let err = client.health().await.unwrap_err();
        assert!(err.to_string().contains("500"));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn mock_proof_is_deterministic_for_a_pinned_nullifier() {
        let owner = Address::repeat_byte(0xa1);
        let a = ProofPayload::mock(owner, U256::ZERO, Some(U256::from(5)));
        let b = ProofPayload::mock(owner, U256::ZERO, Some(U256::from(5)));
        assert_eq!(a.proof, b.proof);
        assert_eq!(a.nullifier_hash, U256::from(5));
        assert!(a.proof.iter().all(|e| *e < (U256::from(1) << 248usize)));

        let fresh = ProofPayload::mock(owner, U256::ZERO, None);
        assert!(fresh.nullifier_hash < (U256::from(1) << 248usize));
    }
}
