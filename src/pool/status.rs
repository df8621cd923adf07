use serde::Deserialize;

/// One decoded FPM status payload.
///
/// Field names follow the JSON status page exactly as FPM transmits them.
/// A value of this type stored in a pool cache is always the result of one
/// fully successful fetch-and-decode cycle; the all-zero value stands in
/// until the first successful poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolStatus {
    #[serde(rename = "start time")]
    pub start_time: i64,
    #[serde(rename = "start since")]
    pub start_since: i64,
    #[serde(rename = "accepted conn")]
    pub accepted_conn: i64,
    #[serde(rename = "listen queue")]
    pub listen_queue: i64,
    #[serde(rename = "max listen queue")]
    pub max_listen_queue: i64,
    #[serde(rename = "listen queue len")]
    pub listen_queue_len: i64,
    #[serde(rename = "idle processes")]
    pub idle_processes: i64,
    #[serde(rename = "active processes")]
    pub active_processes: i64,
    #[serde(rename = "total processes")]
    pub total_processes: i64,
    #[serde(rename = "max active processes")]
    pub max_active_processes: i64,
    #[serde(rename = "max children reached")]
    pub max_children_reached: i64,
    #[serde(rename = "slow requests")]
    pub slow_requests: i64,
}

impl PoolStatus {
    /// Decode a JSON status payload as served with `?json`.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
