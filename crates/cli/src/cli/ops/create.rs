use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use unibucket::BucketError;

#[derive(Args, Debug, Clone)]
pub struct Create;

#[derive(Debug)]
pub struct CreateOutput {
    pub bucket: String,
}

impl fmt::Display for CreateOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", "Ready".green().bold(), self.bucket.bold())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Create {
    type Error = CreateError;
    type Output = CreateOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        ctx.manager.create().await?;
        Ok(CreateOutput {
            bucket: ctx.bucket.name().to_string(),
        })
    }
}
