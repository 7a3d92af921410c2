use std::fmt;

use chrono::{DateTime, Utc};
use clap::Args;
use comfy_table::Table;

use unibucket::{collect_items, BucketError};

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Directory (or file) to list, defaults to the bucket root
    #[arg(default_value = "/")]
    pub path: String,
}

#[derive(Debug)]
pub struct LsEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub mod_time: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct LsOutput {
    pub entries: Vec<LsEntry>,
}

impl fmt::Display for LsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "No items found");
        }

        let mut table = Table::new();
        table.set_header(vec!["TYPE", "NAME", "SIZE", "MODIFIED"]);
        for entry in &self.entries {
            let type_str = if entry.is_dir { "dir" } else { "file" };
            let size = if entry.is_dir {
                "-".to_string()
            } else {
                entry.size.to_string()
            };
            let modified = entry
                .mod_time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec![type_str.to_string(), entry.name.clone(), size, modified]);
        }
        write!(f, "{table}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
    #[error("Bucket {0} cannot list directories")]
    NotListable(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = LsError;
    type Output = LsOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let lister = ctx
            .bucket
            .as_listable()
            .ok_or_else(|| LsError::NotListable(ctx.bucket.name().to_string()))?;
        let mut items = collect_items(lister.items(&self.path).await?).await?;
        items.sort_by(|a, b| a.name().cmp(b.name()));

        let entries = items
            .iter()
            .map(|item| LsEntry {
                name: item.name().to_string(),
                is_dir: item.is_dir(),
                size: item.size(),
                mod_time: item.mod_time(),
            })
            .collect();
        Ok(LsOutput { entries })
    }
}
