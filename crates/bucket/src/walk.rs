//! Depth-first walk over anything that can list one directory level.
//!
//! Backends without a native recursive walk get one here: the root level is
//! listed, every entry is offered to the visitor, and directories are listed
//! in turn before their later siblings (pre-order). The recursion is kept on
//! an explicit stack of open iterators so every iterator can be closed on
//! every way out of the walk.

use tracing::trace;

use crate::bucket::{ListIterator, Listable, Visitor, WalkSignal};
use crate::error::Result;

/// Walk the subtree below `dir` using `list`.
///
/// The root itself is not visited unless it names a file, in which case the
/// file is the only entry. A missing root is an empty walk. Listing failures
/// below the root go to the visitor, which decides whether to go on.
pub async fn walk_listing(list: &dyn Listable, dir: &str, visitor: &mut Visitor<'_>) -> Result<()> {
    let root = match list.items(dir).await {
        Ok(iter) => iter,
        Err(err) if err.is_not_found() => return Ok(()),
        Err(err) => return Err(err),
    };

    let mut stack: Vec<Box<dyn ListIterator>> = vec![root];
    // Directories the visitor asked to skip. Entries below them are dropped
    // even if a listing already produced them.
    let mut skipped: Vec<String> = Vec::new();

    while let Some(iter) = stack.last_mut() {
        let item = match iter.next().await {
            Ok(Some(item)) => item,
            Ok(None) => {
                if let Some(mut done) = stack.pop() {
                    done.close().await;
                }
                continue;
            }
            Err(err) => {
                if let Some(mut failed) = stack.pop() {
                    failed.close().await;
                }
                if visitor(Err(err)) == WalkSignal::Stop {
                    break;
                }
                continue;
            }
        };

        if skipped.iter().any(|prefix| item.name().starts_with(prefix.as_str())) {
            trace!(name = %item.name(), "suppressing entry under skipped directory");
            continue;
        }

        match visitor(Ok(&item)) {
            WalkSignal::Stop => break,
            WalkSignal::SkipSubtree => {
                if item.is_dir() {
                    skipped.push(item.name().to_string());
                }
                continue;
            }
            WalkSignal::Continue => {}
        }

        if item.is_dir() {
            match list.items(item.name()).await {
                Ok(child) => stack.push(child),
                Err(err) => {
                    if visitor(Err(err)) == WalkSignal::Stop {
                        break;
                    }
                }
            }
        }
    }

    while let Some(mut iter) = stack.pop() {
        iter.close().await;
    }
    Ok(())
}
