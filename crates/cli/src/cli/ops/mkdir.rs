use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use unibucket::{BucketError, WriteOptions};

use super::put::parse_mode;

#[derive(Args, Debug, Clone)]
pub struct Mkdir {
    /// Directory to create
    pub path: String,

    /// Create missing parents as well
    #[arg(short, long)]
    pub parents: bool,

    /// Permission bits for new directories (octal, local buckets only)
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<u32>,
}

#[derive(Debug)]
pub struct MkdirOutput {
    pub path: String,
}

impl fmt::Display for MkdirOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", "Created".green().bold(), self.path.bold())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MkdirError {
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Mkdir {
    type Error = MkdirError;
    type Output = MkdirOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let opts = match self.mode {
            Some(mode) => WriteOptions::default().with_mode(mode),
            None => WriteOptions::default(),
        };
        if self.parents {
            ctx.bucket.mkdir_all(&self.path, opts).await?;
        } else {
            ctx.bucket.mkdir(&self.path, opts).await?;
        }
        Ok(MkdirOutput {
            path: self.path.clone(),
        })
    }
}
