mod delete;
mod edit;
mod export;
mod list;
mod register;

pub use delete::handle_delete;
pub use edit::handle_edit;
pub use export::handle_export;
pub use list::handle_list;
pub use register::{
    handle_consume, handle_event, handle_purchase, handle_register, handle_transfer,
};
