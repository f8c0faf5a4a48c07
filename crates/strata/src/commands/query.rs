//! Query and single-record handlers.

use strata_core::{DataStore, Record};

use crate::cli::{GlobalOpts, NodeArgs, QueryArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub fn handle(store: &DataStore, args: &QueryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    util::apply_query(store, &args.filter, &args.sort)?;

    if args.count {
        output::print_output(&store.get_count().to_string(), global.quiet);
        return Ok(());
    }

    let records = limited(store.get_records(), args.limit);
    print_records(store, &records, &args.columns, global)
}

pub fn get(store: &DataStore, args: &NodeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let id = util::resolve_id(store, &args.id)?;
    let record = store.get_by_id(&id).ok_or_else(|| CliError::NotFound {
        identifier: args.id.clone(),
    })?;

    let id_field = store.config().id_field.clone();
    let out = output::render_single(
        global.output,
        &record,
        output::render_detail,
        |r| output::cell(r.fields().get(&id_field)),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub(super) fn limited(mut records: Vec<Record>, limit: Option<usize>) -> Vec<Record> {
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    records
}

pub(super) fn print_records(
    store: &DataStore,
    records: &[Record],
    columns: &[String],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let out = output::render_records(global.output, records, columns, &store.config().id_field)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
