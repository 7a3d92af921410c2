use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use unibucket::BucketError;

#[derive(Args, Debug, Clone)]
pub struct Clean {
    /// Confirm that everything in the bucket should be deleted
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug)]
pub struct CleanOutput {
    pub bucket: String,
}

impl fmt::Display for CleanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", "Emptied".green().bold(), self.bucket.bold())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
    #[error("Refusing to empty {0} without --yes")]
    NotConfirmed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Clean {
    type Error = CleanError;
    type Output = CleanOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let bucket = ctx.bucket.name().to_string();
        if !self.yes {
            return Err(CleanError::NotConfirmed(bucket));
        }
        ctx.manager.clean().await?;
        Ok(CleanOutput { bucket })
    }
}
