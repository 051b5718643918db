use ammo_core::dates::parse_date;
use ammo_core::storage::TransactionFilter;

use crate::app::AppContext;
use crate::cli::ListArgs;
use crate::output::print_main_rows;

/// Build a date filter, warning about bounds that will be ignored.
pub fn date_filter(from: Option<&str>, to: Option<&str>) -> TransactionFilter {
    let mut filter = TransactionFilter::new();
    if let Some(value) = from {
        if parse_date(value).is_none() {
            tracing::warn!(from = value, "unrecognized start date, ignoring");
        }
        filter = filter.start_date(value);
    }
    if let Some(value) = to {
        if parse_date(value).is_none() {
            tracing::warn!(to = value, "unrecognized end date, ignoring");
        }
        filter = filter.end_date(value);
    }
    filter
}

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let filter = date_filter(args.from.as_deref(), args.to.as_deref());

    let service = ctx.open_service()?;
    let rows = service.get_main_data(&filter)?;
    ctx.close_service(service)?;

    let ui = ctx.ui_context(args.json, args.format.as_deref());
    print_main_rows(&ui, &rows)
}
