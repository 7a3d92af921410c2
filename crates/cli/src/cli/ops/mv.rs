use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use unibucket::BucketError;

#[derive(Args, Debug, Clone)]
pub struct Mv {
    /// Source path
    pub from: String,

    /// Destination path
    pub to: String,
}

#[derive(Debug)]
pub struct MvOutput {
    pub from: String,
    pub to: String,
}

impl fmt::Display for MvOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            "Moved".green().bold(),
            self.from,
            self.to.bold()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MvError {
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Mv {
    type Error = MvError;
    type Output = MvOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        ctx.bucket.rename(&self.from, &self.to).await?;
        Ok(MvOutput {
            from: self.from.clone(),
            to: self.to.clone(),
        })
    }
}
