//! Warehouse zones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockyard_core::{DomainResult, ZoneId};

use crate::text;

/// A named warehouse location products can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub description: Option<String>,
    /// Nominal capacity in stock units; 0 means "not tracked".
    pub capacity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewZone {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub capacity: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub capacity: Option<i64>,
}

impl Zone {
    pub fn create(new: NewZone, now: DateTime<Utc>) -> DomainResult<Zone> {
        Ok(Zone {
            id: ZoneId::new(),
            name: text::required("name", &new.name)?,
            description: text::optional(new.description),
            capacity: text::non_negative("capacity", new.capacity)?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_patch(&mut self, patch: ZonePatch, now: DateTime<Utc>) -> DomainResult<()> {
        let name = patch
            .name
            .as_deref()
            .map(|v| text::required("name", v))
            .transpose()?;
        let capacity = patch
            .capacity
            .map(|v| text::non_negative("capacity", v))
            .transpose()?;

        if let Some(v) = name {
            self.name = v;
        }
        if let Some(description) = patch.description {
            self.description = text::optional(description);
        }
        if let Some(v) = capacity {
            self.capacity = v;
        }
        self.updated_at = now;
        Ok(())
    }
}
