pub mod about_dialog;
pub mod condition_builder;
pub mod result_grid;
pub mod url_input;

pub use about_dialog::AboutDialog;
pub use condition_builder::{BuilderEdit, ConditionBuilder, ConditionPart};
pub use result_grid::{Position, ResultGrid};
pub use url_input::UrlInput;
