use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;
use owo_colors::OwoColorize;

use unibucket::{BucketError, WriteOptions};

#[derive(Args, Debug, Clone)]
pub struct Put {
    /// Local file to upload
    pub source: PathBuf,

    /// Destination path in the bucket
    pub dest: String,

    /// User metadata stored with the file, as key=value
    #[arg(long = "meta", value_parser = parse_meta)]
    pub metadata: Vec<(String, String)>,

    /// Permission bits for the new file (octal, local buckets only)
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<u32>,
}

fn parse_meta(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {s:?}")),
    }
}

pub(crate) fn parse_mode(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s.trim_start_matches("0o"), 8)
        .map_err(|err| format!("invalid mode {s:?}: {err}"))
}

#[derive(Debug)]
pub struct PutOutput {
    pub dest: String,
    pub size: usize,
}

impl fmt::Display for PutOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} bytes)",
            "Wrote".green().bold(),
            self.dest.bold(),
            self.size
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error("Failed to read {path}: {source}")]
    Source {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Put {
    type Error = PutError;
    type Output = PutOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let data = tokio::fs::read(&self.source)
            .await
            .map_err(|source| PutError::Source {
                path: self.source.display().to_string(),
                source,
            })?;

        let mut opts = WriteOptions::default();
        for (key, value) in &self.metadata {
            opts = opts.with_metadata_entry(key, value);
        }
        if let Some(mode) = self.mode {
            opts = opts.with_mode(mode);
        }

        let size = ctx.bucket.write(&self.dest, Bytes::from(data), opts).await?;
        Ok(PutOutput {
            dest: self.dest.clone(),
            size,
        })
    }
}
