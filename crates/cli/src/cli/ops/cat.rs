use std::fmt;

use bytes::Bytes;
use clap::Args;
use owo_colors::OwoColorize;

use unibucket::BucketError;

#[derive(Args, Debug, Clone)]
pub struct Cat {
    /// Path of the file to read
    pub path: String,
}

#[derive(Debug)]
pub enum CatContent {
    Text(String),
    Binary(Bytes),
}

#[derive(Debug)]
pub struct CatOutput {
    pub path: String,
    pub size: usize,
    pub content: CatContent,
}

impl fmt::Display for CatOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {}  {} {} bytes",
            "File:".dimmed(),
            self.path.bold(),
            "Size:".dimmed(),
            self.size
        )?;
        match &self.content {
            CatContent::Text(text) => write!(f, "{text}"),
            CatContent::Binary(bytes) => {
                let hex = bytes
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(f, "{} {hex}", "Binary content (hex):".dimmed())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatError {
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Cat {
    type Error = CatError;
    type Output = CatOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let bytes = ctx.bucket.read(&self.path).await?;
        let content = match std::str::from_utf8(&bytes) {
            Ok(text) => CatContent::Text(text.to_string()),
            Err(_) => CatContent::Binary(bytes.clone()),
        };

        Ok(CatOutput {
            path: self.path.clone(),
            size: bytes.len(),
            content,
        })
    }
}
