use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Required column '{column}' is missing from the input table")]
    MissingColumn { column: String },

    #[error("Input table has no header row")]
    EmptyInput,

    #[error("Unknown threshold '{name}'")]
    UnknownThreshold { name: String },

    #[error("Invalid value {value} for threshold '{name}'")]
    InvalidThreshold { name: String, value: f64 },

    #[error("Invalid table name '{name}'")]
    InvalidTableName { name: String },

    #[error("{stage} failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<ScanError>,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScanError {
    /// Tag an error with the pipeline stage it surfaced in.
    pub fn in_stage(self, stage: &'static str) -> Self {
        match self {
            already @ ScanError::Stage { .. } => already,
            other => ScanError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, with stage tags peeled off.
    pub fn root(&self) -> &ScanError {
        match self {
            ScanError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
