//! [`RemoteStore`] over the cloud API.
//!
//! Watches are polling loops: each poll fetches the full scoped view and
//! emits it as a snapshot when it differs from the last one delivered.
//! Transient API failures keep the loop alive; permanent ones end the watch
//! with a terminal `Failed` event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use rand::Rng;
use serde_json::Value;
use tokio::time::sleep;

use mealfolio_core::errors::{Error, Result};
use mealfolio_core::store::{
    ChangeSink, CollectionEvent, EntityKind, RemoteStore, RemoteWatch, Scope,
};

use crate::client::MealfolioApiClient;
use crate::error::{ApiRetryClass, RemoteApiError};

/// Base interval between polls of a watched collection.
const POLL_INTERVAL_MS: u64 = 2_000;
/// Upper bound of the random jitter added to each poll interval.
const POLL_JITTER_MS: u64 = 400;

fn poll_delay(interval: Duration) -> Duration {
    interval + Duration::from_millis(rand::thread_rng().gen_range(0..=POLL_JITTER_MS))
}

fn map_doc_error(err: RemoteApiError, kind: EntityKind, id: &str) -> Error {
    if err.is_not_found() {
        Error::not_found(kind, id)
    } else {
        err.into()
    }
}

pub struct HttpRemoteStore {
    client: MealfolioApiClient,
    token: String,
    poll_interval: Duration,
}

impl HttpRemoteStore {
    pub fn new(client: MealfolioApiClient, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
        }
    }

    /// Override the poll interval (tests, aggressive foreground refresh).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn watch(&self, kind: EntityKind, scope: Scope, sink: ChangeSink) -> Result<RemoteWatch> {
        let client = self.client.clone();
        let token = self.token.clone();
        let interval = self.poll_interval;
        let cancelled = Arc::new(AtomicBool::new(false));
        let cancelled_task = Arc::clone(&cancelled);

        let handle = tokio::spawn(async move {
            let mut last: Option<Vec<Value>> = None;
            loop {
                if cancelled_task.load(Ordering::SeqCst) {
                    break;
                }
                match client.list_documents(&token, kind, &scope).await {
                    Ok(page) => {
                        if last.as_ref() != Some(&page.documents) {
                            sink(CollectionEvent::Snapshot(page.documents.clone()));
                            last = Some(page.documents);
                        }
                    }
                    Err(err) => match err.retry_class() {
                        ApiRetryClass::Retryable => {
                            warn!("poll of {} failed, will retry: {}", kind, err);
                        }
                        ApiRetryClass::Permanent | ApiRetryClass::ReauthRequired => {
                            sink(CollectionEvent::Failed(err.to_string()));
                            break;
                        }
                    },
                }
                sleep(poll_delay(interval)).await;
            }
            debug!("watch on {} ended", kind);
        });

        Ok(RemoteWatch::new(move || {
            cancelled.store(true, Ordering::SeqCst);
            handle.abort();
        }))
    }

    async fn list(&self, kind: EntityKind, scope: &Scope) -> Result<Vec<Value>> {
        let page = self
            .client
            .list_documents(&self.token, kind, scope)
            .await
            .map_err(Error::from)?;
        Ok(page.documents)
    }

    async fn get(&self, kind: EntityKind, owner_id: &str, id: &str) -> Result<Value> {
        self.client
            .get_document(&self.token, kind, owner_id, id)
            .await
            .map_err(|err| map_doc_error(err, kind, id))
    }

    async fn create(&self, kind: EntityKind, owner_id: &str, doc: Value) -> Result<String> {
        let created = self
            .client
            .create_document(&self.token, kind, owner_id, &doc)
            .await
            .map_err(Error::from)?;
        Ok(created.id)
    }

    async fn update(&self, kind: EntityKind, owner_id: &str, id: &str, patch: Value) -> Result<()> {
        self.client
            .update_document(&self.token, kind, owner_id, id, &patch)
            .await
            .map(|_| ())
            .map_err(|err| map_doc_error(err, kind, id))
    }

    async fn delete(&self, kind: EntityKind, owner_id: &str, id: &str) -> Result<()> {
        self.client
            .delete_document(&self.token, kind, owner_id, id)
            .await
            .map(|_| ())
            .map_err(|err| map_doc_error(err, kind, id))
    }

    async fn upsert_singleton(&self, kind: EntityKind, owner_id: &str, doc: Value) -> Result<()> {
        self.client
            .upsert_singleton(&self.token, kind, owner_id, &doc)
            .await
            .map(|_| ())
            .map_err(Error::from)
    }

    async fn set_active_plan(&self, owner_id: &str, plan_id: &str) -> Result<()> {
        self.client
            .activate_plan(&self.token, owner_id, plan_id)
            .await
            .map(|_| ())
            .map_err(|err| map_doc_error(err, EntityKind::MealPlan, plan_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Mock server answering successive requests from a script; after the
    /// script runs out it keeps serving the last response.
    async fn start_scripted_server(
        responses: Vec<(u16, String)>,
    ) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let scripted = Arc::new(StdMutex::new(VecDeque::from(responses)));

        let handle = tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(value) => value,
                    Err(_) => break,
                };
                let (status, body) = {
                    let mut scripted = scripted.lock().unwrap();
                    match scripted.len() {
                        0 => (500, "{}".to_string()),
                        1 => scripted.front().cloned().unwrap(),
                        _ => scripted.pop_front().unwrap(),
                    }
                };
                let mut buffer = vec![0u8; 8192];
                let _ = stream.read(&mut buffer).await;
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.flush().await;
            }
        });

        (format!("http://{}", addr), handle)
    }

    fn collect_sink() -> (ChangeSink, Arc<StdMutex<Vec<CollectionEvent>>>) {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let events_inner = Arc::clone(&events);
        let sink: ChangeSink = Arc::new(move |event| {
            events_inner.lock().unwrap().push(event);
        });
        (sink, events)
    }

    #[tokio::test]
    async fn watch_emits_initial_snapshot_then_fails_terminally() {
        let page = json!({ "documents": [{ "id": "r1", "name": "Dal" }] }).to_string();
        let error = json!({ "code": "GONE", "message": "collection deleted" }).to_string();
        let (base_url, server) = start_scripted_server(vec![(200, page), (404, error)]).await;

        let store = HttpRemoteStore::new(MealfolioApiClient::new(&base_url), "token")
            .with_poll_interval(Duration::from_millis(10));
        let (sink, events) = collect_sink();
        let _watch = store
            .watch(EntityKind::Recipe, Scope::owned("u1"), sink)
            .await
            .unwrap();

        // First poll snapshots, second hits the permanent error.
        tokio::time::sleep(Duration::from_millis(600)).await;
        let events = events.lock().unwrap();
        assert!(matches!(&events[0], CollectionEvent::Snapshot(docs) if docs.len() == 1));
        assert!(matches!(&events[1], CollectionEvent::Failed(message) if message.contains("GONE")));
        assert_eq!(events.len(), 2);

        server.abort();
    }

    #[tokio::test]
    async fn missing_document_maps_to_not_found() {
        let error = json!({ "code": "NOT_FOUND", "message": "no such document" }).to_string();
        let (base_url, server) = start_scripted_server(vec![(404, error)]).await;

        let store = HttpRemoteStore::new(MealfolioApiClient::new(&base_url), "token");
        let err = store
            .get(EntityKind::Recipe, "u1", "missing")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        server.abort();
    }
}
