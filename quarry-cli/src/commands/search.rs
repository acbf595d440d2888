use super::parse_value;
use anyhow::{bail, Result};
use clap::Args;
use quarry::{Builder, MemoryTransport, Model, Transport};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Index to search
    #[arg(short, long)]
    pub index: String,

    /// Predicate, e.g. --where price ">=" 10 (repeatable)
    #[arg(long = "where", num_args = 3, value_names = ["FIELD", "OP", "VALUE"], allow_hyphen_values = true)]
    pub wheres: Vec<String>,

    /// Sort field, FIELD or FIELD:desc (repeatable)
    #[arg(long)]
    pub sort: Vec<String>,

    /// Fields to return (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Hits per page
    #[arg(long, default_value = "10")]
    pub size: usize,

    /// Page number, starting at 1
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Print the compiled request instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

/// Apply command-line predicates and shaping to a builder
pub fn apply(builder: &mut Builder<'_>, args: &SearchArgs) -> Result<()> {
    for predicate in args.wheres.chunks(3) {
        let [field, op, value] = predicate else {
            bail!("--where takes FIELD OP VALUE");
        };
        builder.where_op(field, op, parse_value(value))?;
    }

    for sort in &args.sort {
        let (field, desc) = match sort.rsplit_once(':') {
            Some((field, "desc")) => (field, true),
            Some((field, "asc")) => (field, false),
            Some(_) => bail!("Sort '{}' must be FIELD, FIELD:asc or FIELD:desc", sort),
            None => (sort.as_str(), false),
        };
        builder.order_by(field, desc);
    }

    if !args.select.is_empty() {
        builder.select(args.select.iter().cloned());
    }
    Ok(())
}

/// Run the search and print the page as JSON
pub async fn run_search(transport: Arc<dyn Transport>, args: &SearchArgs) -> Result<()> {
    let model = Model::new(args.index.clone(), transport);
    let mut builder = model.query();
    apply(&mut builder, args)?;

    let page = builder.page(args.size, args.page).await?;
    tracing::info!(
        index = %args.index,
        hits = page.len(),
        total = ?page.total(),
        "Search complete"
    );
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

/// Compile the search against a recording transport and return what would be sent
pub async fn run_dry_run(args: &SearchArgs) -> Result<Value> {
    let transport = Arc::new(MemoryTransport::new());
    transport.push_response(json!({"hits": {"total": {"value": 0}, "hits": []}}));

    let model = Model::new(args.index.clone(), transport.clone());
    let mut builder = model.query();
    apply(&mut builder, args)?;
    builder.page(args.size, args.page).await?;

    match transport.last_call() {
        Some((method, params)) => Ok(json!({"method": method.as_str(), "params": params})),
        None => bail!("No request was compiled"),
    }
}
