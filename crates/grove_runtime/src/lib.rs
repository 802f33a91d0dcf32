//! Runtime for Grove.
//!
//! - `executor`: the request pipeline (parse, validate, select, execute)
//! - `collect`: field collection with `@skip`/`@include` and fragments
//! - `request`, `response`, `error`: what goes in and what comes out
//! - `config`: executor tunables
//!
//! ```ignore
//! let executor = Executor::new(schema);
//! let response = executor.execute(Request::new("{ hero { name } }")).await;
//! ```

mod collect;
pub mod config;
pub mod error;
pub mod executor;
pub mod request;
pub mod response;

pub use config::ExecutorConfig;
pub use error::{ErrorKind, GraphQLError};
pub use executor::Executor;
pub use request::Request;
pub use response::Response;

use grove_semantic::Schema;
use std::sync::OnceLock;
use tokio::runtime::{Builder, Handle, Runtime};

/// Executes one request to completion on a shared background runtime.
///
/// Intended for synchronous callers. Called from inside an async runtime it
/// returns an error response instead of blocking a worker thread.
pub fn graphql(schema: &Schema, request: impl Into<Request>) -> Response {
    if Handle::try_current().is_ok() {
        return Response::error(GraphQLError::new(
            ErrorKind::Operation,
            "graphql() cannot block inside an async runtime; await Executor::execute instead.",
        ));
    }
    let Some(runtime) = shared_runtime() else {
        return Response::error(GraphQLError::new(
            ErrorKind::Operation,
            "Failed to start the execution runtime.",
        ));
    };
    runtime.block_on(Executor::new(schema.clone()).execute(request))
}

fn shared_runtime() -> Option<&'static Runtime> {
    static RUNTIME: OnceLock<Option<Runtime>> = OnceLock::new();
    RUNTIME
        .get_or_init(|| {
            Builder::new_multi_thread()
                .thread_name("grove-exec")
                .enable_all()
                .build()
                .map_err(|error| tracing::warn!(%error, "failed to build execution runtime"))
                .ok()
        })
        .as_ref()
}
