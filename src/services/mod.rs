pub mod data_service;
pub mod export_service;
pub mod fetch_service;
pub mod preferences;

pub use data_service::DataService;
pub use export_service::ExportFormat;
pub use fetch_service::{FetchEvent, FetchService};
pub use preferences::{PreferenceStore, Preferences};
