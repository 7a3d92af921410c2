use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use unibucket::BucketError;

#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Path to remove
    pub path: String,

    /// Remove directories and their contents
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug)]
pub struct RmOutput {
    pub path: String,
}

impl fmt::Display for RmOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", "Removed".green().bold(), self.path.bold())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rm {
    type Error = RmError;
    type Output = RmOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        if self.recursive {
            ctx.bucket.remove_all(&self.path).await?;
        } else {
            ctx.bucket.remove(&self.path).await?;
        }
        Ok(RmOutput {
            path: self.path.clone(),
        })
    }
}
