//! Band model definitions.
//!
//! # Purpose
//! Defines the band record and the compact band summary embedded in rehearsal
//! payloads returned by the store and HTTP API.
use chrono::{DateTime, Utc};
use encore_common::ids::BandId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub id: BandId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BandSummary {
    pub id: BandId,
    pub name: String,
}

impl From<&Band> for BandSummary {
    fn from(band: &Band) -> Self {
        BandSummary {
            id: band.id,
            name: band.name.clone(),
        }
    }
}
