//! Activity catalog: the set of activities and their participant rosters.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tokio::sync::RwLock;

use crate::roster::RosterError;
use crate::types::{ActivityName, Email};

/// One activity and its roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub description: String,
    pub schedule: String,
    pub max_participants: usize,
    #[serde(default)]
    pub participants: Vec<Email>,
}

impl Activity {
    pub fn new(
        description: impl Into<String>,
        schedule: impl Into<String>,
        max_participants: usize,
    ) -> Self {
        Self {
            description: description.into(),
            schedule: schedule.into(),
            max_participants,
            participants: Vec::new(),
        }
    }

    pub fn is_registered(&self, email: &str) -> bool {
        self.participants.iter().any(|p| p.as_str() == email)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_participants
    }

    /// Append a participant. Duplicates are checked before capacity.
    pub fn add_participant(&mut self, email: Email) -> Result<(), RosterError> {
        if self.is_registered(email.as_str()) {
            return Err(RosterError::AlreadySignedUp);
        }
        if self.is_full() {
            return Err(RosterError::CapacityExceeded);
        }
        self.participants.push(email);
        Ok(())
    }

    pub fn remove_participant(&mut self, email: &str) -> Result<(), RosterError> {
        let idx = self
            .participants
            .iter()
            .position(|p| p.as_str() == email)
            .ok_or(RosterError::NotRegistered)?;
        self.participants.remove(idx);
        Ok(())
    }

    /// Check roster invariants on seeded data.
    fn validate(&self, name: &ActivityName) -> anyhow::Result<()> {
        if self.participants.len() > self.max_participants {
            return Err(anyhow::anyhow!(
                "Activity `{}` has {} participants but room for {}",
                name,
                self.participants.len(),
                self.max_participants
            ));
        }
        for (i, p) in self.participants.iter().enumerate() {
            if self.participants[..i].contains(p) {
                return Err(anyhow::anyhow!(
                    "Activity `{}` lists `{}` more than once",
                    name,
                    p
                ));
            }
        }
        Ok(())
    }
}

/// Ordered list of activities as read from seed data.
///
/// Serializes as a JSON object whose key order follows the list order, and
/// deserializes from a JSON object preserving the order of its keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityList(pub Vec<(ActivityName, Activity)>);

impl ActivityList {
    pub fn iter(&self) -> impl Iterator<Item = &(ActivityName, Activity)> {
        self.0.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Activity> {
        self.0
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, a)| a)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject duplicate activity names and rosters that break the capacity
    /// or uniqueness rules.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, (name, activity)) in self.0.iter().enumerate() {
            if self.0[..i].iter().any(|(n, _)| n == name) {
                return Err(anyhow::anyhow!("Duplicate activity `{}`", name));
            }
            activity.validate(name)?;
        }
        Ok(())
    }
}

impl Serialize for ActivityList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, activity) in &self.0 {
            map.serialize_entry(name, activity)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ActivityList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ListVisitor;

        impl<'de> Visitor<'de> for ListVisitor {
            type Value = ActivityList;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of activity name to activity")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, activity)) = access.next_entry::<ActivityName, Activity>()? {
                    entries.push((name, activity));
                }
                Ok(ActivityList(entries))
            }
        }

        deserializer.deserialize_map(ListVisitor)
    }
}

#[derive(Debug, Default)]
struct CatalogInner {
    entries: Vec<(ActivityName, Activity)>,
    index: HashMap<ActivityName, usize>,
}

/// Shared, lock-guarded catalog. Activities are fixed at construction;
/// only rosters change afterwards.
#[derive(Debug, Default)]
pub struct ActivityCatalog {
    inner: RwLock<CatalogInner>,
}

impl ActivityCatalog {
    /// Build a catalog from seed data, validating every roster.
    pub fn new(seed: ActivityList) -> anyhow::Result<Self> {
        seed.validate()?;
        let mut inner = CatalogInner::default();
        for (name, activity) in seed.0 {
            inner.index.insert(name.clone(), inner.entries.len());
            inner.entries.push((name, activity));
        }
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    /// Consistent copy of the whole catalog in insertion order.
    pub async fn snapshot(&self) -> ActivityList {
        ActivityList(self.inner.read().await.entries.clone())
    }

    pub async fn get(&self, name: &str) -> Option<Activity> {
        let inner = self.inner.read().await;
        inner.index.get(name).map(|&i| inner.entries[i].1.clone())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Run `f` against one activity while holding the write lock, so the
    /// whole check-then-mutate sequence is atomic.
    pub async fn update<F, R>(&self, name: &str, f: F) -> Result<R, RosterError>
    where
        F: FnOnce(&mut Activity) -> Result<R, RosterError>,
    {
        let mut inner = self.inner.write().await;
        let idx = *inner.index.get(name).ok_or(RosterError::ActivityNotFound)?;
        f(&mut inner.entries[idx].1)
    }
}
