use rgsweep_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("Resource group not found: {0}")]
    GroupNotFound(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
