//! Inventory input form
//!
//! Holds the four raw text fields the user types into, validates them all at
//! once, and hands a typed `InventoryInput` to the caller on success. No
//! network knowledge lives here.

use replenish_common::{Messages, ReplenishError};
use replenish_proto::{InventoryInput, MAX_CURRENT_BALANCE};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One input field of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ItemName,
    CurrentBalance,
    Consumption,
    Cogs,
}

impl Field {
    /// All fields, in display order
    pub const ALL: [Field; 4] = [
        Field::ItemName,
        Field::CurrentBalance,
        Field::Consumption,
        Field::Cogs,
    ];

    /// Wire name of the field
    pub fn name(&self) -> &'static str {
        match self {
            Field::ItemName => "item_name",
            Field::CurrentBalance => "current_balance",
            Field::Consumption => "consumption",
            Field::Cogs => "cogs",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| format!("unknown field: {}", s))
    }
}

/// Per-field validation failures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    fn insert(&mut self, field: Field, message: &str) {
        self.errors.insert(field, message.to_string());
    }

    fn remove(&mut self, field: Field) {
        self.errors.remove(&field);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationErrors> for ReplenishError {
    fn from(errors: ValidationErrors) -> Self {
        ReplenishError::Validation(errors.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RawFields {
    item_name: String,
    current_balance: String,
    consumption: String,
    cogs: String,
}

impl RawFields {
    fn get(&self, field: Field) -> &str {
        match field {
            Field::ItemName => &self.item_name,
            Field::CurrentBalance => &self.current_balance,
            Field::Consumption => &self.consumption,
            Field::Cogs => &self.cogs,
        }
    }

    fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::ItemName => &mut self.item_name,
            Field::CurrentBalance => &mut self.current_balance,
            Field::Consumption => &mut self.consumption,
            Field::Cogs => &mut self.cogs,
        }
    }
}

/// The input collector's state: raw text plus the errors shown next to it
#[derive(Debug, Clone)]
pub struct InventoryForm {
    values: RawFields,
    errors: ValidationErrors,
    messages: &'static Messages,
}

impl InventoryForm {
    pub fn new(messages: &'static Messages) -> Self {
        Self {
            values: RawFields::default(),
            errors: ValidationErrors::default(),
            messages,
        }
    }

    /// Update a field's raw text. A changed value drops the field's error.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        let slot = self.values.get_mut(field);
        if *slot != value {
            *slot = value;
            self.errors.remove(field);
        }
    }

    pub fn value(&self, field: Field) -> &str {
        self.values.get(field)
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(field)
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Check every field without touching form state
    pub fn validate(&self) -> Result<InventoryInput, ValidationErrors> {
        let messages = self.messages;
        let mut errors = ValidationErrors::default();

        if self.values.item_name.trim().is_empty() {
            errors.insert(Field::ItemName, messages.item_name_required);
        }

        let current_balance = parse_number(&self.values.current_balance);
        match current_balance {
            Some(balance) if balance < 0.0 => {
                errors.insert(Field::CurrentBalance, messages.current_balance_min)
            }
            Some(balance) if balance > MAX_CURRENT_BALANCE => {
                errors.insert(Field::CurrentBalance, messages.current_balance_max)
            }
            Some(_) => {}
            None => errors.insert(Field::CurrentBalance, messages.current_balance_min),
        }

        let consumption = parse_number(&self.values.consumption).filter(|v| *v > 0.0);
        if consumption.is_none() {
            errors.insert(Field::Consumption, messages.consumption_positive);
        }

        let cogs = parse_number(&self.values.cogs).filter(|v| *v > 0.0);
        if cogs.is_none() {
            errors.insert(Field::Cogs, messages.cogs_positive);
        }

        match (current_balance, consumption, cogs) {
            (Some(current_balance), Some(consumption), Some(cogs)) if errors.is_empty() => {
                Ok(InventoryInput {
                    item_name: self.values.item_name.clone(),
                    current_balance,
                    consumption,
                    cogs,
                })
            }
            _ => Err(errors),
        }
    }

    /// Validate and, on success, hand back the submission and clear the form.
    ///
    /// On failure the fields are kept and the shown errors are replaced by
    /// this run's errors.
    pub fn submit(&mut self) -> Result<InventoryInput, ValidationErrors> {
        match self.validate() {
            Ok(input) => {
                self.errors = ValidationErrors::default();
                self.values = RawFields::default();
                Ok(input)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }
}

/// Parse a raw field as a finite number. Empty text does not parse.
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
