use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A days-past-due bucket (e.g. `B3`, 91-180 days).
///
/// `max_days = None` means the bucket is open-ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct DpdBucket {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub min_days: i32,
    pub max_days: Option<i32>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DpdBucket {
    pub fn contains(&self, days: i32) -> bool {
        days >= self.min_days && self.max_days.map_or(true, |max| days <= max)
    }
}

/// Whether two inclusive day ranges share at least one day.
pub fn ranges_overlap(a_min: i32, a_max: Option<i32>, b_min: i32, b_max: Option<i32>) -> bool {
    let a_hi = a_max.unwrap_or(i32::MAX);
    let b_hi = b_max.unwrap_or(i32::MAX);
    a_min <= b_hi && b_min <= a_hi
}

/// The first of `buckets` (other than `exclude`) sharing a day with
/// `[min_days, max_days]`.
pub fn first_overlap(
    buckets: &[DpdBucket],
    min_days: i32,
    max_days: Option<i32>,
    exclude: Option<Uuid>,
) -> Option<&DpdBucket> {
    buckets.iter().find(|b| {
        !b.is_deleted
            && Some(b.id) != exclude
            && ranges_overlap(b.min_days, b.max_days, min_days, max_days)
    })
}

/// Check the shape of a bucket range. Returns an error message on failure.
pub fn validate_range(min_days: i32, max_days: Option<i32>) -> Result<(), String> {
    if min_days < 0 {
        return Err("min_days must be >= 0".to_string());
    }
    if let Some(max) = max_days {
        if max < min_days {
            return Err(format!(
                "max_days ({}) must be >= min_days ({})",
                max, min_days
            ));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DpdBucketResponse {
    pub id: String,
    pub code: String,
    pub name: String,
    pub min_days: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_days: Option<i32>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<DpdBucket> for DpdBucketResponse {
    fn from(b: DpdBucket) -> Self {
        Self {
            id: b.id.to_string(),
            code: b.code,
            name: b.name,
            min_days: b.min_days,
            max_days: b.max_days,
            is_active: b.is_active,
            created_at: b.created_at.to_rfc3339(),
            updated_at: b.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateDpdBucketRequest {
    pub code: String,
    pub name: String,
    pub min_days: i32,
    #[serde(default)]
    pub max_days: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Partial update. `max_days` uses a nested option so callers can clear
/// the upper bound with an explicit `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateDpdBucketRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_days: Option<i32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_some"
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<i32>))]
    pub max_days: Option<Option<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
