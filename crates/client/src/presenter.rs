//! Result presenter
//!
//! Picks one of three mutually exclusive view states and renders it as a
//! terminal card.

use replenish_proto::PredictionResult;
use serde::Serialize;
use std::fmt::Write as _;

/// What the result card currently shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    /// Nothing submitted yet
    #[default]
    Idle,

    /// The last submission failed
    Error { message: String },

    /// The last submission produced a forecast
    Result { prediction: PredictionResult },
}

impl ViewState {
    /// Choose the state to show. An error wins over a result.
    pub fn select(result: Option<PredictionResult>, error: Option<String>) -> Self {
        match (error.filter(|message| !message.is_empty()), result) {
            (Some(message), _) => ViewState::Error { message },
            (None, Some(prediction)) => ViewState::Result { prediction },
            (None, None) => ViewState::Idle,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ViewState::Error { .. })
    }

    /// Plain-text card for the terminal
    pub fn render(&self) -> String {
        let mut out = String::from("Recommended Order Quantity\n\n");

        match self {
            ViewState::Idle => {
                out.push_str("Start by entering your inventory details\n");
                out.push_str("We'll calculate an optimal order quantity and highlight the item name here.\n");
            }
            ViewState::Error { message } => {
                let _ = writeln!(out, "Error");
                let _ = writeln!(out, "{}", message);
            }
            ViewState::Result { prediction } => {
                let name = if prediction.item_name.is_empty() {
                    "—"
                } else {
                    prediction.item_name.as_str()
                };
                let _ = writeln!(
                    out,
                    "Recommended Order: {} units",
                    format_quantity(prediction.recommended_order_quantity)
                );
                let _ = writeln!(out, "Item Name: {}", name);
                if let Some(version) = &prediction.model_version {
                    let _ = writeln!(out, "Model: {}", version);
                }
                if let Some(generated_at) = &prediction.generated_at {
                    let _ = writeln!(out, "Generated: {}", generated_at);
                }
            }
        }

        out
    }
}

/// Format a quantity with thousands separators and at most two decimals
pub fn format_quantity(value: f64) -> String {
    if !value.is_finite() {
        return "--".to_string();
    }

    // Past ~1.8e306 the scaled value overflows; decimals no longer matter there
    let scaled = value * 100.0;
    let rounded = if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    };
    // Avoid printing "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };

    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}
