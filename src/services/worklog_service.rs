use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::{is_blank, ServiceError};
use crate::database::{LocatedRecord, Record, Repository};

const REQUIRED_ON_CREATE: [&str; 3] = ["date", "duration_hours", "reason"];

/// Worklog CRUD scoped to the owning user.
pub struct WorklogService {
    worklogs: Repository,
}

impl WorklogService {
    pub fn new(worklogs: Repository) -> Self {
        Self { worklogs }
    }

    /// The user's worklogs, newest date first, with `duration_hours` as a number.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Record>, ServiceError> {
        let mut mine: Vec<Record> = self
            .worklogs
            .list_all()
            .await?
            .into_iter()
            .filter(|log| log.text("user_id") == user_id)
            .map(|mut log| {
                let hours = as_number(&log.text("duration_hours"));
                log.set("duration_hours", hours);
                log
            })
            .collect();

        mine.sort_by(|a, b| date_key(&b.text("date")).cmp(&date_key(&a.text("date"))));
        Ok(mine)
    }

    pub async fn create(&self, user_id: &str, fields: Map<String, Value>) -> Result<Record, ServiceError> {
        let missing: Vec<&'static str> = REQUIRED_ON_CREATE
            .into_iter()
            .filter(|f| is_blank(fields.get(*f)))
            .collect();
        if !missing.is_empty() {
            return Err(ServiceError::missing_fields(
                "Missing required fields (date, duration_hours, reason)",
                missing,
            ));
        }

        let mut record = Record::new();
        record
            .set("id", format!("log-{}", Uuid::new_v4().simple()))
            .set("user_id", user_id);
        for field in ["date", "duration_hours", "reason", "notes"] {
            let value = fields.get(field).cloned().unwrap_or(Value::Null);
            record.set(field, value);
        }
        let record = record.project(self.worklogs.schema().columns);

        self.worklogs.append(&record).await?;
        info!("User {} created worklog {}", user_id, record.text("id"));
        Ok(record)
    }

    /// Merges `patch` over the stored row and rewrites it. `id` and `user_id`
    /// keep their stored values whatever the patch says.
    pub async fn update(&self, user_id: &str, id: &str, patch: Map<String, Value>) -> Result<Record, ServiceError> {
        let LocatedRecord { position, record } = self.owned(user_id, id, "modify").await?;

        let mut merged = record.clone();
        merged.merge(patch);
        merged.set("id", record.text("id")).set("user_id", record.text("user_id"));
        let merged = merged.project(self.worklogs.schema().columns);

        self.worklogs.update_at(position, &merged).await?;
        info!("User {} updated worklog {} at row {}", user_id, id, position);
        Ok(merged)
    }

    /// Physically removes the worklog and returns what was stored.
    pub async fn delete(&self, user_id: &str, id: &str) -> Result<Record, ServiceError> {
        let LocatedRecord { position, record } = self.owned(user_id, id, "delete").await?;
        self.worklogs.delete_at(position).await?;
        info!("User {} deleted worklog {} from row {}", user_id, id, position);
        Ok(record)
    }

    /// Resolves `id` to its current row and checks the caller owns it.
    async fn owned(&self, user_id: &str, id: &str, action: &str) -> Result<LocatedRecord, ServiceError> {
        let found = self
            .worklogs
            .find_by_id("id", id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Worklog not found".to_string()))?;

        if found.record.text("user_id") != user_id {
            warn!("User {} tried to {} worklog {} owned by someone else", user_id, action, id);
            return Err(ServiceError::Forbidden(format!("Not allowed to {} this worklog", action)));
        }
        Ok(found)
    }
}

/// Numeric reading of a cell: "" is 0, unparseable text is null.
fn as_number(text: &str) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return Value::from(0);
    }
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Sort key for a date cell. Unparseable dates sort after every real date.
fn date_key(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime);
        }
    }
    DateTime::parse_from_rfc3339(text).ok().map(|d| d.naive_utc())
}
