use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::error::StoreError;
use crate::model::request::{NewRequest, Request, RequestId, RequestStatus};
use crate::models::RequestStats;
use crate::utils::request_id::generate_unique_request_id;

/// File name of the request collection inside the data directory.
pub const DB_FILE: &str = "requests_data.json";

/// Durable request collection.
///
/// The in-memory map and the file are only ever changed together under the
/// write lock: a mutation is applied in memory, the whole collection is
/// rewritten, and the in-memory change is rolled back if the write fails.
/// Readers get clones and never see a half-applied mutation.
pub struct RequestStore {
    path: PathBuf,
    requests: RwLock<BTreeMap<RequestId, Request>>,
}

impl RequestStore {
    /// Opens the collection at `path`, starting empty when the file is
    /// missing or unreadable.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent).await {
                error!(error = %e, dir = %parent.display(), "Failed to create data directory");
            }
        }

        let requests = Self::load(&path).await;
        Self {
            path,
            requests: RwLock::new(requests),
        }
    }

    /// Reads the persisted collection. Corrupt data is logged and dropped
    /// rather than blocking startup.
    pub async fn load(path: &Path) -> BTreeMap<RequestId, Request> {
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("{} not found, a new one will be created", path.display());
                return BTreeMap::new();
            }
            Err(e) => {
                log::error!("Failed to read {}: {}", path.display(), e);
                return BTreeMap::new();
            }
        };

        match serde_json::from_str::<BTreeMap<RequestId, Request>>(&raw) {
            Ok(requests) => {
                log::info!("Loaded {} requests from {}", requests.len(), path.display());
                requests
            }
            Err(e) => {
                log::error!(
                    "Failed to decode {}, starting with an empty store: {}",
                    path.display(),
                    e
                );
                BTreeMap::new()
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stores a new pending request under a fresh id. The request only
    /// exists once this returns `Ok`.
    pub async fn create(&self, new: NewRequest) -> Result<Request, StoreError> {
        let mut requests = self.requests.write().await;

        let id = generate_unique_request_id(|id| requests.contains_key(id));
        let request = Request::from_new(id.clone(), new, Utc::now());
        requests.insert(id.clone(), request.clone());

        if let Err(e) = self.persist(&requests).await {
            requests.remove(&id);
            return Err(e);
        }

        info!(request_id = %id, kind = %request.kind(), requester = %request.requester_id, "Request created");
        Ok(request)
    }

    #[cfg(test)]
    pub async fn get(&self, id: &RequestId) -> Result<Request, StoreError> {
        self.requests
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Decides a pending request. Fails with `InvalidTransition` when the
    /// request already left `Pending`, so a decision is applied at most once.
    pub async fn update_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
        decided_at: DateTime<Utc>,
    ) -> Result<Request, StoreError> {
        let mut requests = self.requests.write().await;

        let current = requests
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut updated = current.clone();
        updated.transition(status, decided_at)?;

        let previous = requests.insert(id.clone(), updated.clone());

        if let Err(e) = self.persist(&requests).await {
            if let Some(previous) = previous {
                requests.insert(id.clone(), previous);
            }
            return Err(e);
        }

        info!(request_id = %id, status = %status, "Request status updated");
        Ok(updated)
    }

    /// Copy of the whole collection.
    #[cfg(test)]
    pub async fn snapshot(&self) -> BTreeMap<RequestId, Request> {
        self.requests.read().await.clone()
    }

    pub async fn stats(&self) -> RequestStats {
        let requests = self.requests.read().await;

        requests.values().fold(
            RequestStats {
                total: requests.len(),
                ..RequestStats::default()
            },
            |mut stats, request| {
                match request.status {
                    RequestStatus::Pending => stats.pending += 1,
                    RequestStatus::Approved => stats.approved += 1,
                    RequestStatus::Denied => stats.denied += 1,
                }
                stats
            },
        )
    }

    /// Rewrites the whole collection: write a sibling temp file, flush it to
    /// disk, then rename it over the previous file. The old file is intact
    /// until the rename.
    async fn persist(&self, requests: &BTreeMap<RequestId, Request>) -> Result<(), StoreError> {
        let unavailable = |source: io::Error| StoreError::Unavailable {
            path: self.path.display().to_string(),
            source,
        };

        let bytes = serde_json::to_vec_pretty(requests).map_err(|e| unavailable(io::Error::other(e)))?;
        let tmp = self.temp_path();

        if let Err(e) = write_synced(&tmp, &bytes).await {
            let _ = fs::remove_file(&tmp).await;
            error!(error = %e, path = %tmp.display(), "Failed to write request store");
            return Err(unavailable(e));
        }

        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            error!(error = %e, path = %self.path.display(), "Failed to replace request store");
            return Err(unavailable(e));
        }

        Ok(())
    }

    pub(crate) fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}
