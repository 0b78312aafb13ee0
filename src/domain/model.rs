use serde::{Deserialize, Deserializer, Serialize};

/// One purchasable medicine. Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineRecord {
    pub id: String,
    /// Display name, strength included as free text (e.g. "Paracetamol 500mg").
    pub name: String,
    pub price: f64,
    pub unit: String,
    pub stock: u32,
}

impl MedicineRecord {
    pub fn new(id: &str, name: &str, price: f64, unit: &str, stock: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            price,
            unit: unit.to_string(),
            stock,
        }
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A medicine mention read off a prescription, before catalog resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMention {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_quantity",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<u32>,
}

impl ExtractedMention {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dosage: None,
            quantity: None,
        }
    }

    pub fn with_dosage(mut self, dosage: &str) -> Self {
        self.dosage = Some(dosage.to_string());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// 空字串視同未提供
    pub fn dosage(&self) -> Option<&str> {
        self.dosage.as_deref().filter(|d| !d.trim().is_empty())
    }

    /// Quantity asked for on the prescription; absent or zero means one.
    pub fn requested_quantity(&self) -> u32 {
        match self.quantity {
            Some(q) if q > 0 => q,
            _ => 1,
        }
    }
}

/// 模型輸出的數量可能是整數、浮點數或字串，無法解析或非正數時視為未提供
fn deserialize_quantity<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let quantity = match value {
        Some(serde_json::Value::Number(n)) => {
            n.as_u64().or_else(|| n.as_f64().and_then(round_quantity))
        }
        Some(serde_json::Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(quantity
        .filter(|q| *q > 0)
        .map(|q| u32::try_from(q).unwrap_or(u32::MAX)))
}

/// 小數四捨五入，結果小於 1 則視為未提供
fn round_quantity(f: f64) -> Option<u64> {
    if !f.is_finite() {
        return None;
    }
    let rounded = f.round();
    if rounded != f {
        tracing::debug!("Rounded fractional quantity {} to {}", f, rounded);
    }
    (rounded >= 1.0).then_some(rounded as u64)
}

/// A cart line pointing into the catalog it was resolved against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine<'c> {
    pub medicine: &'c MedicineRecord,
    pub quantity: u32,
}

impl CartLine<'_> {
    pub fn subtotal(&self) -> f64 {
        self.medicine.price * f64::from(self.quantity)
    }

    pub fn to_entry(&self) -> CartEntry {
        CartEntry {
            medicine_id: self.medicine.id.clone(),
            quantity: self.quantity,
        }
    }
}

/// Flat cart line as sent back by a client between pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub medicine_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationResult<'c> {
    pub matched: Vec<CartLine<'c>>,
    pub unmatched: Vec<ExtractedMention>,
}

impl ReconciliationResult<'_> {
    pub fn empty() -> Self {
        Self {
            matched: Vec::new(),
            unmatched: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionOutcome {
    /// Every extracted mention landed in the cart.
    AllMatched,
    /// Some mentions matched; the rest are reported alongside.
    PartialMatch,
    /// Mentions were extracted but none matched an available medicine.
    NoMatchesFound,
    /// The model found no medicines on the prescription.
    EmptyExtraction,
}

impl PrescriptionOutcome {
    pub fn classify(extracted: usize, result: &ReconciliationResult<'_>) -> Self {
        if extracted == 0 {
            PrescriptionOutcome::EmptyExtraction
        } else if result.matched.is_empty() {
            PrescriptionOutcome::NoMatchesFound
        } else if result.unmatched.is_empty() {
            PrescriptionOutcome::AllMatched
        } else {
            PrescriptionOutcome::PartialMatch
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrescriptionReport<'c> {
    pub medicines: Vec<ExtractedMention>,
    #[serde(flatten)]
    pub result: ReconciliationResult<'c>,
    pub outcome: PrescriptionOutcome,
}

impl PrescriptionReport<'_> {
    /// e.g. "2 of 3 medicines found in our stock"
    pub fn summary(&self) -> String {
        let total = self.result.total();
        format!(
            "{} of {} medicine{} found in our stock",
            self.result.matched.len(),
            total,
            if total == 1 { "" } else { "s" }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSummary<'c> {
    pub lines: Vec<CartLine<'c>>,
    pub total_items: u32,
    pub total_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub medicine_id: String,
    pub name: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub subtotal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub lines: Vec<ReceiptLine>,
    pub total_items: u32,
    pub total_amount: f64,
    pub currency: String,
    pub paid_at: chrono::DateTime<chrono::Utc>,
}
