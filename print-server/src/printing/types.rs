//! Receipt printing types

use chrono::{DateTime, Utc};
use comanda_printer::{NetworkPrinter, PrintResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::money::lenient_amount;

/// One ordered dish, as the kitchen sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub food_name: String,
    #[serde(default = "default_quantity", deserialize_with = "lenient_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ReceiptLine {
    pub fn new(food_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            food_name: food_name.into(),
            quantity: quantity.max(1),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Notes worth printing (non-empty after trim)
    pub fn notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// A dish with its price, for the cash receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedReceiptLine {
    #[serde(flatten)]
    pub line: ReceiptLine,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub unit_price: Decimal,
    /// Per-unit extra charge (zero when absent)
    #[serde(default, deserialize_with = "lenient_amount")]
    pub surcharge: Decimal,
}

impl PricedReceiptLine {
    pub fn new(line: ReceiptLine, unit_price: Decimal) -> Self {
        Self {
            line,
            unit_price,
            surcharge: Decimal::ZERO,
        }
    }

    pub fn with_surcharge(mut self, surcharge: Decimal) -> Self {
        self.surcharge = surcharge;
        self
    }

    fn quantity(&self) -> Decimal {
        Decimal::from(self.line.quantity)
    }

    /// `unit_price * quantity`
    pub fn base_total(&self) -> Decimal {
        self.unit_price * self.quantity()
    }

    /// `surcharge * quantity`
    pub fn surcharge_total(&self) -> Decimal {
        self.surcharge * self.quantity()
    }

    /// `(unit_price + surcharge) * quantity`
    pub fn total(&self) -> Decimal {
        self.base_total() + self.surcharge_total()
    }
}

/// How the customer paid
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    #[default]
    Unknown,
    Other(String),
}

impl PaymentMethod {
    /// Label printed on the receipt
    pub fn label(&self) -> String {
        match self {
            PaymentMethod::Cash => "CONTANTI".to_string(),
            PaymentMethod::Card => "PAGAMENTO ELETTRONICO".to_string(),
            PaymentMethod::Unknown => "-".to_string(),
            PaymentMethod::Other(s) => s.to_uppercase(),
        }
    }
}

impl From<&str> for PaymentMethod {
    fn from(s: &str) -> Self {
        let s = s.trim();
        match s.to_ascii_uppercase().as_str() {
            "CASH" => PaymentMethod::Cash,
            "CARD" => PaymentMethod::Card,
            "" => PaymentMethod::Unknown,
            _ => PaymentMethod::Other(s.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for PaymentMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(PaymentMethod::from).unwrap_or_default())
    }
}

/// Order metadata printed in receipt headers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptContext {
    /// Short order code shown to staff
    #[serde(default, deserialize_with = "lenient_string")]
    pub display_code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub table: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer: String,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ticket_number: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub discount: Decimal,
    /// Tear-off slips, one per entry
    #[serde(default)]
    pub single_tickets: Vec<ReceiptLine>,
}

/// A printer resolved by the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterTarget {
    pub id: String,
    pub ip: String,
    pub port: u16,
}

impl PrinterTarget {
    pub fn new(id: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            ip: ip.into(),
            port,
        }
    }

    /// Reject an empty ip or port 0 before any network call
    pub fn validate(&self) -> PrintResult<()> {
        NetworkPrinter::new(&self.ip, self.port).map(|_| ())
    }
}

fn default_quantity() -> u32 {
    1
}

/// Quantities arrive as numbers or numeric strings; anything unusable is 1
fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let quantity = match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };
    Ok(u32::try_from(quantity).unwrap_or(u32::MAX).max(1))
}

/// Codes and table names are sometimes numeric upstream
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}
