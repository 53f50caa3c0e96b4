//! Replenish client
//!
//! Input form, proxy client, failure reconciliation and result presentation.

pub mod form;
pub mod predict_client;
pub mod presenter;
pub mod reconcile;
pub mod session;

pub use form::{Field, InventoryForm, ValidationErrors};
pub use predict_client::PredictClient;
pub use presenter::{format_quantity, ViewState};
pub use reconcile::failure_message;
pub use session::Session;
