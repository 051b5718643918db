use ammo_core::storage::Position;

use crate::app::AppContext;
use crate::cli::DeleteArgs;
use crate::ui::{print, receipt};

pub fn handle_delete(ctx: &AppContext, args: &DeleteArgs) -> anyhow::Result<()> {
    let position: Position = args.position.parse()?;

    let mut service = ctx.open_service()?;
    let id = service.delete_main_record(position)?;
    ctx.close_service(service)?;

    if !ctx.quiet() {
        let ui = ctx.ui_context(false, None);
        let items = [("Position", position.to_string()), ("ID", id.to_string())];
        print(&ui, &receipt(&ui, "Deleted transaction", &items));
    }
    Ok(())
}
