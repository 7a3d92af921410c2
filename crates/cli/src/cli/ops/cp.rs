use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use unibucket::{BucketError, CopyOptions};

#[derive(Args, Debug, Clone)]
pub struct Cp {
    /// Source path
    pub from: String,

    /// Destination path
    pub to: String,

    /// Copy directories and everything below them
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug)]
pub struct CpOutput {
    pub from: String,
    pub to: String,
}

impl fmt::Display for CpOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            "Copied".green().bold(),
            self.from,
            self.to.bold()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CpError {
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
    #[error("{0} is a directory (use --recursive)")]
    Directory(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Cp {
    type Error = CpError;
    type Output = CpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let item = ctx.bucket.stat(&self.from).await?;
        if item.is_dir() && !self.recursive {
            return Err(CpError::Directory(self.from.clone()));
        }
        ctx.bucket
            .copy_all(&item, &self.to, CopyOptions::default())
            .await?;
        Ok(CpOutput {
            from: self.from.clone(),
            to: self.to.clone(),
        })
    }
}
