//! Tree projection and traversal handlers.

use strata_core::DataStore;

use crate::cli::{GlobalOpts, NodeArgs, OutputFormat, QueryArgs, TreeArgs};
use crate::commands::query::{limited, print_records};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub fn tree(store: &DataStore, args: &TreeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    util::apply_query(store, &args.filter, &args.sort)?;
    let nodes = store.to_tree();
    let config = store.config();

    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => output::render_tree(
            &nodes,
            &config.children_field,
            &args.label,
            &config.id_field,
            global.output == OutputFormat::Table && output::should_color(global.color),
        ),
        OutputFormat::Json => output::render_json(&nodes, false)?,
        OutputFormat::JsonCompact => output::render_json(&nodes, true)?,
        OutputFormat::Yaml => output::render_yaml(&nodes)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn roots(store: &DataStore, args: &QueryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    util::apply_query(store, &args.filter, &args.sort)?;
    let roots = store.get_root_nodes();
    if args.count {
        output::print_output(&roots.len().to_string(), global.quiet);
        return Ok(());
    }
    print_records(store, &limited(roots, args.limit), &args.columns, global)
}

pub fn children(store: &DataStore, args: &NodeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let id = util::resolve_id(store, &args.id)?;
    print_records(store, &store.get_direct_children(&id), &args.columns, global)
}

pub fn descendants(store: &DataStore, args: &NodeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let id = util::resolve_id(store, &args.id)?;
    print_records(store, &store.get_node_children(&id), &args.columns, global)
}

pub fn path(store: &DataStore, args: &NodeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let id = util::resolve_id(store, &args.id)?;
    print_records(store, &store.get_node_path(&id), &args.columns, global)
}
