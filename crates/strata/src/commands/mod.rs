//! Command dispatch: bridges CLI args -> store operations -> output formatting.

pub mod config_cmd;
pub mod query;
pub mod tree;
pub mod util;

use strata_core::{DataStore, EventPayload, Listener};
use strata_proxy::{FileProxy, HttpProxy};
use tracing::debug;

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Config, Source};
use crate::error::CliError;

/// Build a store for the resolved source and load it.
pub async fn open_store(global: &GlobalOpts, cfg: &Config) -> Result<DataStore, CliError> {
    let store_config = config::resolve_store_config(global, cfg)?;
    let source = config::resolve_source(global, cfg)?;
    let description = source.describe();

    let builder = DataStore::builder().config(store_config);
    let store = match source {
        Source::File(path) => builder.proxy(FileProxy::new(path)).build(),
        Source::Http { url, transport } => {
            let proxy = HttpProxy::new(url, &transport)
                .map_err(|e| CliError::load(description.clone(), e.into()))?;
            builder.proxy(proxy).build()
        }
    };

    store.subscribe(
        "load",
        Listener::from_fn(|payload| {
            if let EventPayload::Load { data } = payload {
                debug!(count = data.len(), "records loaded");
            }
        }),
    );

    debug!(source = %description, "loading records");
    store
        .load()
        .await
        .map_err(|e| CliError::load(description, e))?;
    Ok(store)
}

/// Dispatch a store-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let store = open_store(global, cfg).await?;

    match cmd {
        Command::Query(args) => query::handle(&store, &args, global),
        Command::Get(args) => query::get(&store, &args, global),
        Command::Tree(args) => tree::tree(&store, &args, global),
        Command::Roots(args) => tree::roots(&store, &args, global),
        Command::Children(args) => tree::children(&store, &args, global),
        Command::Descendants(args) => tree::descendants(&store, &args, global),
        Command::Path(args) => tree::path(&store, &args, global),
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before dispatch".into(),
        )),
    }
}
