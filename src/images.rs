// Room images kept in object storage; rooms only store the public URLs

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::StorageError;
use crate::store::RoomRepository;

const KEY_PREFIX: &str = "rooms/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub domain: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "staywise-room-images".to_string(),
            domain: "s3.amazonaws.com".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn public_url(&self, key: &str) -> String {
        format!("https://{}.{}/{}", self.bucket, self.domain, key)
    }

    // Inverse of `public_url` for URLs minted by this bucket
    pub fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        let base = format!("https://{}.{}/", self.bucket, self.domain);
        url.strip_prefix(base.as_str())
    }
}

pub fn image_key(filename: &str) -> String {
    format!("{}{}_{}", KEY_PREFIX, Uuid::new_v4(), filename)
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError>;

    // Deleting an absent key succeeds
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, (Bytes, String)>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.objects
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.remove(key);
        Ok(())
    }
}

pub struct RoomImages {
    objects: Arc<dyn ObjectStore>,
    rooms: Arc<dyn RoomRepository>,
    config: StorageConfig,
}

impl RoomImages {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        rooms: Arc<dyn RoomRepository>,
        config: StorageConfig,
    ) -> Self {
        Self {
            objects,
            rooms,
            config,
        }
    }

    // Uploads without touching any room; used when a room is being created
    pub async fn upload(&self, files: Vec<ImageUpload>) -> Result<Vec<String>, StorageError> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            let key = image_key(&file.filename);
            self.objects
                .put(&key, file.data, &file.content_type)
                .await?;
            urls.push(self.config.public_url(&key));
        }
        Ok(urls)
    }

    pub async fn add_to_room(
        &self,
        room_id: &str,
        files: Vec<ImageUpload>,
    ) -> Result<Vec<String>, StorageError> {
        let urls = self.upload(files).await?;
        self.rooms.append_images(room_id, &urls).await?;
        Ok(urls)
    }

    // Storage deletes are best-effort; the room's list is always updated
    pub async fn remove_from_room(
        &self,
        room_id: &str,
        urls: &[String],
    ) -> Result<(), StorageError> {
        for url in urls {
            let Some(key) = self.config.key_for_url(url) else {
                continue;
            };
            if let Err(e) = self.objects.delete(key).await {
                warn!(room_id, key, error = %e, "failed to delete room image");
            }
        }
        self.rooms.remove_images(room_id, urls).await?;
        Ok(())
    }
}
