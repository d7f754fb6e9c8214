use serde::{Deserialize, Serialize};

pub const METRIC_WAITING: &str = "oWaiting";
pub const METRIC_ACTIVE: &str = "oActive";

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// `GET /api/v2/users?presence=ONLINE&expand=presence`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub entities: Option<Vec<User>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub presence: Option<UserPresence>,
}

impl User {
    pub fn presence_definition(&self) -> Option<&PresenceDefinition> {
        self.presence
            .as_ref()
            .and_then(|p| p.presence_definition.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPresence {
    #[serde(default)]
    pub presence_definition: Option<PresenceDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceDefinition {
    #[serde(default)]
    pub system_presence: Option<String>,
    #[serde(default)]
    pub language_labels: Option<LanguageLabels>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageLabels {
    #[serde(default, rename = "en_US")]
    pub en_us: Option<String>,
}

/// Body of `POST /api/v2/analytics/queues/observations/query`.
#[derive(Debug, Clone, Serialize)]
pub struct ObservationQuery {
    pub filter: QueryFilter,
    pub metrics: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryFilter {
    #[serde(rename = "type")]
    pub filter_type: String,
    pub predicates: Vec<serde_json::Value>,
}

impl ObservationQuery {
    /// Waiting and active counts for every queue (an empty OR filter does
    /// not restrict anything).
    pub fn all_queues() -> Self {
        Self {
            filter: QueryFilter {
                filter_type: "OR".to_string(),
                predicates: Vec::new(),
            },
            metrics: vec![METRIC_WAITING.to_string(), METRIC_ACTIVE.to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservationResponse {
    #[serde(default)]
    pub results: Option<Vec<QueueObservation>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueObservation {
    #[serde(default)]
    pub group: QueueGroup,
    #[serde(default)]
    pub data: Option<Vec<MetricObservation>>,
}

impl QueueObservation {
    pub fn display_name(&self) -> &str {
        self.group
            .name
            .as_deref()
            .or(self.group.queue_id.as_deref())
            .unwrap_or("(unknown queue)")
    }

    /// Count for the first entry named `metric`; absent metric or count is 0.
    pub fn metric_count(&self, metric: &str) -> u64 {
        self.data
            .iter()
            .flatten()
            .find(|m| m.metric.as_deref() == Some(metric))
            .and_then(|m| m.stats.as_ref())
            .and_then(|s| s.count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueGroup {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub queue_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricObservation {
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub stats: Option<MetricStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricStats {
    #[serde(default)]
    pub count: Option<u64>,
}
