use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use unibucket::{BucketError, ItemInfo, ItemSys};

#[derive(Args, Debug, Clone)]
pub struct Stat {
    /// Path to describe
    pub path: String,
}

#[derive(Debug)]
pub struct StatOutput {
    pub name: String,
    pub is_dir: bool,
    pub info: ItemInfo,
}

impl fmt::Display for StatOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_dir { "directory" } else { "file" };
        writeln!(f, "{} ({kind})", self.name.bold())?;
        writeln!(f, "  {} {}", "Size:".dimmed(), self.info.size)?;
        writeln!(f, "  {} {:o}", "Mode:".dimmed(), self.info.mode)?;
        if let Some(mod_time) = self.info.mod_time {
            writeln!(f, "  {} {}", "Modified:".dimmed(), mod_time.to_rfc3339())?;
        }
        if let Some(etag) = &self.info.etag {
            writeln!(f, "  {} {etag}", "ETag:".dimmed())?;
        }
        match &self.info.sys {
            Some(ItemSys::Local { inode, readonly }) => {
                writeln!(f, "  {} {inode}", "Inode:".dimmed())?;
                writeln!(f, "  {} {readonly}", "Read-only:".dimmed())?;
            }
            Some(ItemSys::Remote { version: Some(version) }) => {
                writeln!(f, "  {} {version}", "Version:".dimmed())?;
            }
            _ => {}
        }
        if !self.info.metadata.is_empty() {
            writeln!(f, "  {}", "Metadata:".dimmed())?;
            for (key, value) in &self.info.metadata {
                writeln!(f, "    {key} = {value}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatError {
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Stat {
    type Error = StatError;
    type Output = StatOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let item = ctx.bucket.stat(&self.path).await?;
        let info = item.info().await?.clone();
        Ok(StatOutput {
            name: item.name().to_string(),
            is_dir: item.is_dir(),
            info,
        })
    }
}
