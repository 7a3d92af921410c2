use std::fmt;
use std::sync::Arc;

use unibucket::{Bucket, BucketManager, OpenedBucket};

/// Everything a command needs to run against the configured bucket.
#[derive(Debug, Clone)]
pub struct OpContext {
    pub bucket: Arc<dyn Bucket>,
    pub manager: Arc<dyn BucketManager>,
}

impl From<OpenedBucket> for OpContext {
    fn from(opened: OpenedBucket) -> Self {
        Self {
            bucket: opened.bucket,
            manager: opened.manager,
        }
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;
    type Output: fmt::Display + fmt::Debug + Send;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

/// Build a `Command` subcommand enum over a list of ops, together with the
/// `OpError` and `OpOutput` enums that wrap each op's results.
#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $op:ty)),* $(,)?) => {
        #[derive(clap::Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($op),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$op as $crate::cli::op::Op>::Error),
            )*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$op as $crate::cli::op::Op>::Output),)*
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(OpOutput::$variant(output) => write!(f, "{output}"),)*
                }
            }
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Error = OpError;
            type Output = OpOutput;

            async fn execute(
                &self,
                ctx: &$crate::cli::op::OpContext,
            ) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => op
                            .execute(ctx)
                            .await
                            .map(OpOutput::$variant)
                            .map_err(OpError::$variant),
                    )*
                }
            }
        }
    };
}
