// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uploaded models kept in memory between requests.
//!
//! A session is keyed by the SHA256 of the uploaded bytes, so uploading the
//! same file again reuses its property set index and match results; the
//! latest upload's file name wins. The store holds at most `max_models`
//! sessions and evicts the oldest upload.

use crate::error::ApiError;
use ifc_marker::{find_elements, IfcModel, MatchSet, PsetIndex, SchemaVersion, Selection};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, RwLock};

/// One uploaded model.
pub struct ModelSession {
    pub key: String,
    file_name: RwLock<String>,
    pub content: Arc<String>,
    pub schema: SchemaVersion,
    pub entity_count: usize,
    index: OnceCell<Arc<PsetIndex>>,
    matches: Mutex<FxHashMap<Selection, Arc<MatchSet>>>,
}

impl ModelSession {
    /// Open the content once to validate it and read its header.
    pub fn open(key: String, file_name: String, content: String) -> Result<Self, ApiError> {
        let (schema, entity_count) = {
            let model = IfcModel::open(&content)?;
            (model.schema(), model.entity_count())
        };

        Ok(Self {
            key,
            file_name: RwLock::new(file_name),
            content: Arc::new(content),
            schema,
            entity_count,
            index: OnceCell::new(),
            matches: Mutex::new(FxHashMap::default()),
        })
    }

    /// Name of the most recent upload of this content.
    pub async fn file_name(&self) -> String {
        self.file_name.read().await.clone()
    }

    pub async fn set_file_name(&self, file_name: &str) {
        let mut current = self.file_name.write().await;
        if *current != file_name {
            tracing::debug!(key = %self.key, from = %current, to = %file_name, "Renamed model session");
            *current = file_name.to_string();
        }
    }

    /// Property set index, built on first use.
    pub async fn index(&self) -> Result<Arc<PsetIndex>, ApiError> {
        let index = self
            .index
            .get_or_try_init(|| async {
                let content = self.content.clone();
                let key = self.key.clone();
                let index = tokio::task::spawn_blocking(move || -> Result<PsetIndex, ApiError> {
                    let start = std::time::Instant::now();
                    let mut model = IfcModel::open(&content)?;
                    let index = PsetIndex::build(&mut model);
                    tracing::info!(
                        key = %key,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Indexed property sets"
                    );
                    Ok(index)
                })
                .await??;
                Ok::<_, ApiError>(Arc::new(index))
            })
            .await?;
        Ok(index.clone())
    }

    /// Match scan for a selection, computed once per selection.
    pub async fn matches(&self, selection: &Selection) -> Result<Arc<MatchSet>, ApiError> {
        let mut memo = self.matches.lock().await;
        if let Some(found) = memo.get(selection) {
            tracing::debug!(key = %self.key, filter = %selection.filter_info(), "Match memo HIT");
            return Ok(found.clone());
        }

        let content = self.content.clone();
        let scan_selection = selection.clone();
        let set = tokio::task::spawn_blocking(move || -> Result<MatchSet, ApiError> {
            let mut model = IfcModel::open(&content)?;
            Ok(find_elements(&mut model, &scan_selection)?)
        })
        .await??;

        let set = Arc::new(set);
        memo.insert(selection.clone(), set.clone());
        Ok(set)
    }
}

#[derive(Default)]
struct StoreInner {
    sessions: FxHashMap<String, Arc<ModelSession>>,
    /// Keys in upload order, oldest first
    order: VecDeque<String>,
}

/// In-memory session store.
pub struct ModelStore {
    inner: RwLock<StoreInner>,
    max_models: usize,
}

impl ModelStore {
    pub fn new(max_models: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            max_models: max_models.max(1),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<ModelSession>> {
        self.inner.read().await.sessions.get(key).cloned()
    }

    /// Session for `key`, or a `NotFound` error.
    pub async fn require(&self, key: &str) -> Result<Arc<ModelSession>, ApiError> {
        self.get(key)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("Model not found: {}", key)))
    }

    /// Add a session, evicting the oldest when full. An existing session with
    /// the same key wins.
    pub async fn insert(&self, session: ModelSession) -> Arc<ModelSession> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.sessions.get(&session.key) {
            return existing.clone();
        }

        while inner.sessions.len() >= self.max_models {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.sessions.remove(&oldest);
            tracing::info!(key = %oldest, "Evicted model session");
        }

        let session = Arc::new(session);
        inner.order.push_back(session.key.clone());
        inner.sessions.insert(session.key.clone(), session.clone());
        session
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }
}
