use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

/// Error taxonomy shared by every chart component.
///
/// `Config` and `InvalidParameter` indicate programmer error and are raised
/// synchronously; they are never absorbed into chart status state. Data and
/// fetch failures are absorbed into a user-visible status message first and
/// then propagated to the caller.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("query would return too many data points")]
    TooManyPoints,

    #[error("error loading data: {0}")]
    DataLoad(String),
}
