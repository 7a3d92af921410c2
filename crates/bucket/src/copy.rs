//! Recursive copy.
//!
//! The root entry is copied first. For a directory the source subtree is
//! then walked and every discovered entry is queued for a fixed pool of
//! workers that issue single-entry copies into the destination bucket. The
//! first failure cancels the pool and the walk; the call returns once every
//! worker has stopped. Entries copied before the failure are left in place.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::bucket::{not_supported, Bucket, WalkSignal};
use crate::error::{BucketError, Result};
use crate::item::Item;
use crate::options::CopyOptions;
use crate::path::Separator;

#[derive(Debug)]
struct CopyTask {
    item: Item,
    to: String,
}

/// Maps source names below one prefix to destination names below another.
#[derive(Debug, Clone)]
struct Rebase {
    from_prefix: String,
    from_sep: Separator,
    to_prefix: String,
    to_sep: Separator,
}

impl Rebase {
    fn new(from: &Item, from_sep: Separator, to: &str, to_sep: Separator) -> Self {
        let from_prefix = if from_sep.is_root(from.name()) {
            String::new()
        } else {
            from_sep.directorize(from.name())
        };
        Self {
            from_prefix,
            from_sep,
            to_prefix: to_sep.directorize(to),
            to_sep,
        }
    }

    fn apply(&self, name: &str) -> Result<String> {
        let relative = name
            .strip_prefix(self.from_prefix.as_str())
            .ok_or_else(|| BucketError::InvalidPath(name.to_string()))?;
        let relative = relative.trim_start_matches(self.from_sep.as_char());
        let relative = if self.from_sep == self.to_sep {
            relative.to_string()
        } else {
            relative.replace(self.from_sep.as_char(), &self.to_sep.to_string())
        };
        Ok(format!("{}{}", self.to_prefix, relative))
    }
}

fn record(slot: &Mutex<Option<BucketError>>, err: BucketError) {
    let mut slot = slot.lock();
    if slot.is_none() {
        *slot = Some(err);
    }
}

/// Copy `from` and everything below it to `to` in `dest`, using `workers`
/// concurrent single-entry copies.
pub async fn copy_all(
    dest: Arc<dyn Bucket>,
    from: &Item,
    to: &str,
    opts: CopyOptions,
    workers: usize,
) -> Result<()> {
    if !from.is_dir() {
        return dest.copy(from, to, opts).await;
    }

    let source = from.bucket()?;
    let walker = source
        .as_walkable()
        .ok_or_else(|| not_supported("recursive copy", "non-walkable"))?;

    dest.copy(from, to, opts.clone()).await?;

    let rebase = Rebase::new(from, source.path_separator(), to, dest.path_separator());
    let workers = workers.max(1);
    debug!(from = %from.name(), to = %to, workers, "starting recursive copy");

    let (tx, rx) = flume::unbounded::<CopyTask>();
    let cancel = CancellationToken::new();
    let first_error: Arc<Mutex<Option<BucketError>>> = Arc::new(Mutex::new(None));

    let mut pool = JoinSet::new();
    for worker in 0..workers {
        let rx = rx.clone();
        let dest = dest.clone();
        let cancel = cancel.clone();
        let first_error = first_error.clone();
        let opts = opts.clone();
        pool.spawn(async move {
            loop {
                let task = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    task = rx.recv_async() => match task {
                        Ok(task) => task,
                        Err(_) => break,
                    },
                };
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    result = dest.copy(&task.item, &task.to, opts.clone()) => result,
                };
                if let Err(err) = result {
                    warn!(
                        worker,
                        from = %task.item.name(),
                        to = %task.to,
                        error = %err,
                        "copy worker failed, cancelling recursive copy"
                    );
                    record(&first_error, err);
                    cancel.cancel();
                    break;
                }
            }
        });
    }
    drop(rx);

    let mut queued = 0usize;
    let walked = walker
        .walk(from.name(), &mut |entry| {
            if cancel.is_cancelled() {
                return WalkSignal::Stop;
            }
            let task = entry.and_then(|item| {
                Ok(CopyTask {
                    to: rebase.apply(item.name())?,
                    item: item.clone(),
                })
            });
            match task {
                Ok(task) => {
                    if tx.send(task).is_err() {
                        return WalkSignal::Stop;
                    }
                    queued += 1;
                    WalkSignal::Continue
                }
                Err(err) => {
                    record(&first_error, err);
                    cancel.cancel();
                    WalkSignal::Stop
                }
            }
        })
        .await;
    drop(tx);

    if let Err(err) = walked {
        record(&first_error, err);
        cancel.cancel();
    }

    while let Some(joined) = pool.join_next().await {
        if let Err(err) = joined {
            record(&first_error, BucketError::Task(err.to_string()));
            cancel.cancel();
        }
    }

    let failure = first_error.lock().take();
    match failure {
        Some(err) => Err(err),
        None => {
            debug!(from = %from.name(), to = %to, queued, "recursive copy finished");
            Ok(())
        }
    }
}
