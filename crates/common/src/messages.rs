//! User-facing message catalog
//!
//! Every string a user can see from the proxy or the client form comes from
//! here. Arabic is the reference deployment's display locale.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display locale
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Arabic
    #[default]
    Ar,

    /// English
    En,
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Ar => f.write_str("ar"),
            Locale::En => f.write_str("en"),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ar" => Ok(Locale::Ar),
            "en" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

/// Localized strings for one locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    /// Upstream body was not JSON (502)
    pub invalid_response: &'static str,
    /// Upstream answered with an error status
    pub fetch_failed: &'static str,
    /// Proxy-local failure (500)
    pub proxy_failure: &'static str,
    /// Upstream did not answer in time (504)
    pub upstream_timeout: &'static str,
    /// Client could not reach the proxy at all
    pub connection_failed: &'static str,
    /// Success response without the required fields
    pub response_incomplete: &'static str,
    /// "Error" prefix of the status fallback message
    pub status_prefix: &'static str,
    /// Used when the proxy sent no status text
    pub status_text_fallback: &'static str,

    pub item_name_required: &'static str,
    pub current_balance_min: &'static str,
    pub current_balance_max: &'static str,
    pub consumption_positive: &'static str,
    pub cogs_positive: &'static str,
}

static ARABIC: Messages = Messages {
    invalid_response: "استجابة غير صالحة من الخادم",
    fetch_failed: "تعذر جلب البيانات من الخادم",
    proxy_failure: "حدث خطأ أثناء الاتصال بالخادم",
    upstream_timeout: "انتهت مهلة الاتصال بالخادم",
    connection_failed: "حدث خطأ أثناء الاتصال بالخادم. يرجى المحاولة مرة أخرى.",
    response_incomplete: "الاستجابة من الخادم غير مكتملة",
    status_prefix: "خطأ",
    status_text_fallback: "تعذر الاتصال بالخادم",
    item_name_required: "اسم المنتج مطلوب",
    current_balance_min: "الرصيد الحالي يجب أن يكون صفر أو أكبر",
    current_balance_max: "الرصيد الحالي يجب ألا يزيد عن 100000",
    consumption_positive: "الاستهلاك يجب أن يكون رقمًا أكبر من صفر",
    cogs_positive: "تكلفة البضاعة المباعة يجب أن تكون رقمًا أكبر من صفر",
};

static ENGLISH: Messages = Messages {
    invalid_response: "Invalid response from the server",
    fetch_failed: "Could not fetch data from the server",
    proxy_failure: "An error occurred while contacting the server",
    upstream_timeout: "The server took too long to respond",
    connection_failed: "An error occurred while contacting the server. Please try again.",
    response_incomplete: "The server response is incomplete",
    status_prefix: "Error",
    status_text_fallback: "Could not reach the server",
    item_name_required: "Item name is required",
    current_balance_min: "Current balance must be zero or greater",
    current_balance_max: "Current balance must not exceed 100000",
    consumption_positive: "Consumption must be a number greater than zero",
    cogs_positive: "COGS must be a number greater than zero",
};

impl Messages {
    /// Catalog for a locale
    pub fn for_locale(locale: Locale) -> &'static Messages {
        match locale {
            Locale::Ar => &ARABIC,
            Locale::En => &ENGLISH,
        }
    }

    /// Fallback failure message built from the HTTP status line
    pub fn status_error(&self, status: u16, status_text: &str) -> String {
        let text = if status_text.is_empty() {
            self.status_text_fallback
        } else {
            status_text
        };
        format!("{} {}: {}", self.status_prefix, status, text)
    }
}
