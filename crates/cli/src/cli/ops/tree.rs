use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use unibucket::{BucketError, WalkSignal};

#[derive(Args, Debug, Clone)]
pub struct Tree {
    /// Directory to walk, defaults to the bucket root
    #[arg(default_value = "/")]
    pub path: String,

    /// Do not descend below this many levels
    #[arg(long)]
    pub depth: Option<usize>,
}

#[derive(Debug)]
pub struct TreeOutput {
    /// (depth, name, is_dir) in visit order
    pub entries: Vec<(usize, String, bool)>,
    pub errors: Vec<String>,
}

impl fmt::Display for TreeOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() && self.errors.is_empty() {
            return write!(f, "No items found");
        }
        for (depth, name, is_dir) in &self.entries {
            let indent = "  ".repeat(*depth);
            if *is_dir {
                writeln!(f, "{indent}{}", name.blue().bold())?;
            } else {
                writeln!(f, "{indent}{name}")?;
            }
        }
        for error in &self.errors {
            writeln!(f, "{} {error}", "error:".red())?;
        }
        let dirs = self.entries.iter().filter(|e| e.2).count();
        write!(
            f,
            "{}",
            format!("{} directories, {} files", dirs, self.entries.len() - dirs).dimmed()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
    #[error("Bucket {0} cannot be walked")]
    NotWalkable(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Tree {
    type Error = TreeError;
    type Output = TreeOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let walker = ctx
            .bucket
            .as_walkable()
            .ok_or_else(|| TreeError::NotWalkable(ctx.bucket.name().to_string()))?;
        let sep = ctx.bucket.path_separator();
        let root = sep.sanitize(&self.path);
        let base_depth = if sep.is_root(&root) {
            0
        } else {
            root.matches(sep.as_char()).count() + 1
        };

        let mut entries = Vec::new();
        let mut errors = Vec::new();
        walker
            .walk(&self.path, &mut |entry| match entry {
                Ok(item) => {
                    let name = item.name().trim_end_matches(sep.as_char());
                    let depth = name
                        .matches(sep.as_char())
                        .count()
                        .saturating_sub(base_depth);
                    let label = sep.base(name);
                    entries.push((depth, label, item.is_dir()));
                    match self.depth {
                        Some(max) if item.is_dir() && depth + 1 >= max => WalkSignal::SkipSubtree,
                        _ => WalkSignal::Continue,
                    }
                }
                Err(err) => {
                    errors.push(err.to_string());
                    WalkSignal::Continue
                }
            })
            .await?;

        Ok(TreeOutput { entries, errors })
    }
}
