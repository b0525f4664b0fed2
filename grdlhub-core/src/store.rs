//! JSON document store.
//!
//! Each collection is a directory under the store root and each document is
//! one pretty-printed `<id>.json` file in it. Writes go to a temporary file
//! that is then renamed over the target, so readers never see half a document.

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::appointment::Appointment;
use crate::availability::Availability;
use crate::error::{HubError, HubResult};
use crate::event_type::EventType;
use crate::privilege::Privilege;
use crate::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Appointments,
    Users,
    Privileges,
    EventTypes,
    Availability,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Appointments,
        Collection::Users,
        Collection::Privileges,
        Collection::EventTypes,
        Collection::Availability,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Collection::Appointments => "appointments",
            Collection::Users => "users",
            Collection::Privileges => "privileges",
            Collection::EventTypes => "event_types",
            Collection::Availability => "availability",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// A typed record stored in one collection.
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn document_id(&self) -> String;
}

impl Document for Appointment {
    const COLLECTION: Collection = Collection::Appointments;

    fn document_id(&self) -> String {
        self.id.clone()
    }
}

impl Document for User {
    const COLLECTION: Collection = Collection::Users;

    fn document_id(&self) -> String {
        self.id.clone()
    }
}

impl Document for Privilege {
    const COLLECTION: Collection = Collection::Privileges;

    fn document_id(&self) -> String {
        self.id.clone()
    }
}

impl Document for EventType {
    const COLLECTION: Collection = Collection::EventTypes;

    fn document_id(&self) -> String {
        self.id.clone()
    }
}

impl Document for Availability {
    const COLLECTION: Collection = Collection::Availability;

    fn document_id(&self) -> String {
        Availability::key(&self.user_id, &self.appointment_id, self.date)
    }
}

#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> HubResult<Self> {
        let root = root.into();
        for collection in Collection::ALL {
            tokio::fs::create_dir_all(root.join(collection.dir_name())).await?;
        }
        debug!(root = %root.display(), "Opened document store");
        Ok(JsonStore { root })
    }

    fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.dir_name())
    }

    fn document_path(&self, collection: Collection, id: &str) -> HubResult<PathBuf> {
        validate_id(id)?;
        Ok(self.collection_dir(collection).join(format!("{id}.json")))
    }

    pub async fn get<D: Document>(&self, id: &str) -> HubResult<Option<D>> {
        let path = self.document_path(D::COLLECTION, id)?;

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let doc = serde_json::from_str(&content).map_err(|e| {
            HubError::Serialization(format!("Invalid document {}: {}", path.display(), e))
        })?;
        Ok(Some(doc))
    }

    /// All readable documents of a collection, ordered by file name.
    ///
    /// Documents that fail to parse are skipped with a warning.
    pub async fn list<D: Document>(&self) -> HubResult<Vec<D>> {
        let dir = self.collection_dir(D::COLLECTION);
        let mut entries = tokio::fs::read_dir(&dir).await?;

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut docs = Vec::with_capacity(paths.len());
        for path in paths {
            let parsed = tokio::fs::read_to_string(&path)
                .await
                .map_err(HubError::from)
                .and_then(|content| serde_json::from_str::<D>(&content).map_err(HubError::from));

            match parsed {
                Ok(doc) => docs.push(doc),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable document"),
            }
        }

        Ok(docs)
    }

    pub async fn find<D, F>(&self, filter: F) -> HubResult<Vec<D>>
    where
        D: Document,
        F: Fn(&D) -> bool,
    {
        Ok(self.list::<D>().await?.into_iter().filter(filter).collect())
    }

    /// Create or replace a document by id.
    pub async fn put<D: Document>(&self, doc: &D) -> HubResult<()> {
        let id = doc.document_id();
        let path = self.document_path(D::COLLECTION, &id)?;
        let tmp = self
            .collection_dir(D::COLLECTION)
            .join(format!(".{id}.json.tmp"));

        let content = serde_json::to_string_pretty(doc)?;
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(collection = %D::COLLECTION, id = %id, "Wrote document");
        Ok(())
    }

    /// Delete a document. Returns whether it existed.
    pub async fn delete<D: Document>(&self, id: &str) -> HubResult<bool> {
        let path = self.document_path(D::COLLECTION, id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(collection = %D::COLLECTION, id = %id, "Deleted document");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Ids become file names, so only `[A-Za-z0-9_-]` is allowed.
fn validate_id(id: &str) -> HubResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(HubError::validation(format!("Invalid document id '{id}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::Category;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_put_get_replace_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();

        let mut appt = Appointment::new("Cleaning", Category::Task, date("2025-01-06"));
        store.put(&appt).await.unwrap();

        appt.place = Some("Kingdom Hall".into());
        store.put(&appt).await.unwrap();

        let loaded: Appointment = store.get(&appt.id).await.unwrap().unwrap();
        assert_eq!(loaded.place.as_deref(), Some("Kingdom Hall"));
        assert_eq!(store.list::<Appointment>().await.unwrap().len(), 1);

        assert!(store.delete::<Appointment>(&appt.id).await.unwrap());
        assert!(!store.delete::<Appointment>(&appt.id).await.unwrap());
        assert!(store.get::<Appointment>(&appt.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_skips_invalid_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();

        store.put(&Privilege::new("Field Service")).await.unwrap();
        std::fs::write(dir.path().join("privileges/broken.json"), "{ not json").unwrap();

        let privileges: Vec<Privilege> = store.list().await.unwrap();
        assert_eq!(privileges.len(), 1);

        let broken = store.get::<Privilege>("broken").await;
        assert!(matches!(broken, Err(HubError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();

        let result = store.get::<User>("../users/x").await;
        assert!(matches!(result, Err(HubError::Validation(_))));
    }

    #[tokio::test]
    async fn test_availability_keyed_by_user_appointment_date() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();

        store
            .put(&Availability::new("u1", "a1", date("2025-01-13"), true))
            .await
            .unwrap();
        store
            .put(&Availability::new("u1", "a1", date("2025-01-13"), false))
            .await
            .unwrap();

        let all: Vec<Availability> = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].available);
    }
}
