// ── Data source seam ──
//
// `DataStore::load()` pulls records through a `DataProxy`. Concrete network
// and file proxies live in `strata-proxy`; this module only defines the
// capability and a fixed in-memory implementation.

use futures_util::future::{self, BoxFuture};

use crate::error::CoreError;
use crate::model::{Fields, Record};

/// An injectable asynchronous record source.
pub trait DataProxy: Send + Sync {
    /// Fetch the complete record set.
    fn read(&self) -> BoxFuture<'_, Result<Vec<Record>, CoreError>>;
}

/// A proxy that always yields the same outcome.
///
/// Each successful `read()` returns fresh records, so two loads never share
/// record identity.
#[derive(Debug, Clone)]
pub struct StaticProxy {
    outcome: Result<Vec<Fields>, CoreError>,
}

impl StaticProxy {
    pub fn new(records: Vec<Fields>) -> Self {
        Self {
            outcome: Ok(records),
        }
    }

    /// A proxy whose every read fails with `error`.
    pub fn failing(error: CoreError) -> Self {
        Self {
            outcome: Err(error),
        }
    }
}

impl DataProxy for StaticProxy {
    fn read(&self) -> BoxFuture<'_, Result<Vec<Record>, CoreError>> {
        let result = self
            .outcome
            .clone()
            .map(|records| records.into_iter().map(Record::new).collect());
        Box::pin(future::ready(result))
    }
}
