//! One user session: the form, the proxy client and the result card

use crate::form::{Field, InventoryForm, ValidationErrors};
use crate::predict_client::PredictClient;
use crate::presenter::ViewState;
use replenish_common::Messages;
use tracing::debug;

/// Wires the collector to the proxy and the presenter
pub struct Session {
    form: InventoryForm,
    client: PredictClient,
    view: ViewState,
}

impl Session {
    pub fn new(client: PredictClient, messages: &'static Messages) -> Self {
        Self {
            form: InventoryForm::new(messages),
            client,
            view: ViewState::Idle,
        }
    }

    pub fn form(&self) -> &InventoryForm {
        &self.form
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.form.set_field(field, value);
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Submit the form and wait for the forecast.
    ///
    /// Validation failures stop before any request is made and leave the view
    /// as it was. Otherwise the view ends up in `Result` or `Error`.
    pub async fn submit(&mut self) -> Result<&ViewState, ValidationErrors> {
        let input = self.form.submit()?;
        debug!(?input, "Form submitted");

        self.view = match self.client.predict(&input).await {
            Ok(prediction) => ViewState::select(Some(prediction), None),
            Err(report) => ViewState::select(None, Some(report.message)),
        };

        Ok(&self.view)
    }
}
