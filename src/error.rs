use std::path::PathBuf;

/// Failures raised while interpreting snapshot data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("unknown metric code: {0}")]
    UnknownMetricCode(String),

    #[error("disk {serial}: value {raw:?} of {metric} is not a number")]
    MalformedMetricValue {
        serial: String,
        metric: String,
        raw:    String,
    },

    #[error("disk {serial}: missing required field `{field}`")]
    MissingRequiredField { serial: String, field: String },

    #[error("metric code {0} is configured more than once")]
    DuplicateMetricCode(String),

    #[error("serial {0} appears more than once in the same snapshot")]
    DuplicateSerial(String),
}

/// Failures of the snapshot loader and host identity reader.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("no prediction files found in {}", .0.display())]
    NoPredictionFiles(PathBuf),

    #[error("invalid prediction file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Json {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("host serial file {} is empty", .0.display())]
    EmptyHostSerial(PathBuf),

    #[error("{}: {source}", path.display())]
    Snapshot {
        path:   PathBuf,
        #[source]
        source: EngineError,
    },
}

/// Failures while posting the report payload.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("cannot serialise payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("cannot run curl: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("curl exited with status {code:?}: {stderr}")]
    Transport { code: Option<i32>, stderr: String },

    #[error("endpoint answered HTTP {0}")]
    Status(u16),
}
