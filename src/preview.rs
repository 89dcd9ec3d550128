use anyhow::Result;
use log::info;

use crate::{cli::PreviewArgs, dataset::Dataset, io_utils, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let dataset = Dataset::read(&args.input, delimiter, encoding)?;

    let rows: Vec<Vec<String>> = dataset.rows.iter().take(args.rows).cloned().collect();
    table::print_table(&dataset.headers, &rows);
    info!("Displayed {} row(s) from {:?}", rows.len(), args.input);
    Ok(())
}
