use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CalibrationError {
    #[error("calibration needs exactly 4 corner points, got {got}")]
    CornerCount { got: usize },
    #[error("calibration corners contain a non-finite coordinate")]
    NonFinite,
    #[error("calibration corners are degenerate (collinear or repeated)")]
    Degenerate,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("visit order is empty")]
    EmptyVisitOrder,
    #[error("visit order references target {id}, layout has {count} targets")]
    UnknownTarget { id: usize, count: usize },
    #[error("targets to win must be at least 1")]
    ZeroTargetsToWin,
    #[error("target layout is empty")]
    EmptyLayout,
}

#[derive(Debug, Error)]
pub enum DotboardError {
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("history database error: {0}")]
    History(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DotboardError>;
