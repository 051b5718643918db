use crate::app::AppContext;
use crate::cli::ViewArgs;
use crate::output::{print_inventory, print_json};

pub fn handle_inventory(ctx: &AppContext, args: &ViewArgs) -> anyhow::Result<()> {
    let service = ctx.open_service()?;
    let inventory = service.inventory()?;
    ctx.close_service(service)?;

    let ui = ctx.ui_context(args.json, args.format.as_deref());
    print_inventory(&ui, &inventory)
}

pub fn handle_meta(ctx: &AppContext) -> anyhow::Result<()> {
    let service = ctx.open_service()?;
    let meta = service.get_meta_data()?;
    ctx.close_service(service)?;

    print_json(&meta)
}
