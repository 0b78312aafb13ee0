use crate::core::catalog::Catalog;
use crate::domain::model::{CartEntry, CartLine, CartSummary, MedicineRecord};
use crate::utils::error::{PharmacyError, Result};

/// Session cart. Every line stays within the stock of its record.
#[derive(Debug, Clone)]
pub struct Cart<'c> {
    catalog: &'c Catalog,
    lines: Vec<CartLine<'c>>,
}

impl<'c> Cart<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            lines: Vec::new(),
        }
    }

    /// Rebuilds a cart from entries posted by a client, checking each against the catalog.
    pub fn from_entries(catalog: &'c Catalog, entries: &[CartEntry]) -> Result<Self> {
        let mut cart = Self::new(catalog);
        for entry in entries {
            let medicine = cart.lookup(&entry.medicine_id)?;
            if entry.quantity == 0 {
                return Err(PharmacyError::InvalidQuantity {
                    id: entry.medicine_id.clone(),
                    quantity: entry.quantity,
                });
            }

            let current = cart.quantity_of(&medicine.id);
            let wanted = current.saturating_add(entry.quantity);
            if wanted > medicine.stock {
                return Err(stock_error(medicine));
            }
            cart.set_quantity(medicine, wanted);
        }
        Ok(cart)
    }

    pub fn add(&mut self, medicine_id: &str) -> Result<u32> {
        let medicine = self.lookup(medicine_id)?;
        if !medicine.is_in_stock() {
            return Err(PharmacyError::OutOfStock {
                name: medicine.name.clone(),
            });
        }
        if self.quantity_of(medicine_id) > 0 {
            return self.increment(medicine_id);
        }
        self.lines.push(CartLine {
            medicine,
            quantity: 1,
        });
        Ok(1)
    }

    pub fn increment(&mut self, medicine_id: &str) -> Result<u32> {
        let medicine = self.lookup(medicine_id)?;
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.medicine.id == medicine_id)
            .ok_or_else(|| PharmacyError::ValidationError {
                message: format!("{} is not in the cart", medicine.name),
            })?;

        if line.quantity >= medicine.stock {
            return Err(stock_error(medicine));
        }
        line.quantity += 1;
        Ok(line.quantity)
    }

    /// 數量歸零時移除該品項；不在購物車中則不做事
    pub fn decrement(&mut self, medicine_id: &str) -> u32 {
        let Some(pos) = self.lines.iter().position(|l| l.medicine.id == medicine_id) else {
            return 0;
        };
        let line = &mut self.lines[pos];
        line.quantity = line.quantity.saturating_sub(1);
        let remaining = line.quantity;
        if remaining == 0 {
            self.lines.remove(pos);
        }
        remaining
    }

    /// Merges reconciled prescription lines, summing per record and capping at stock.
    pub fn merge_matched(&mut self, matched: &[CartLine<'c>]) {
        for line in matched {
            let wanted = self
                .quantity_of(&line.medicine.id)
                .saturating_add(line.quantity)
                .min(line.medicine.stock);
            if wanted > 0 {
                self.set_quantity(line.medicine, wanted);
            }
        }
    }

    pub fn quantity_of(&self, medicine_id: &str) -> u32 {
        self.lines
            .iter()
            .find(|l| l.medicine.id == medicine_id)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    pub fn lines(&self) -> &[CartLine<'c>] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn total_price(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn to_entries(&self) -> Vec<CartEntry> {
        self.lines.iter().map(CartLine::to_entry).collect()
    }

    pub fn summary(&self) -> CartSummary<'c> {
        CartSummary {
            lines: self.lines.clone(),
            total_items: self.total_items(),
            total_price: self.total_price(),
        }
    }

    fn lookup(&self, medicine_id: &str) -> Result<&'c MedicineRecord> {
        self.catalog
            .get(medicine_id)
            .ok_or_else(|| PharmacyError::MedicineNotFound {
                id: medicine_id.to_string(),
            })
    }

    fn set_quantity(&mut self, medicine: &'c MedicineRecord, quantity: u32) {
        match self.lines.iter_mut().find(|l| l.medicine.id == medicine.id) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(CartLine { medicine, quantity }),
        }
    }
}

fn stock_error(medicine: &MedicineRecord) -> PharmacyError {
    if medicine.stock == 0 {
        PharmacyError::OutOfStock {
            name: medicine.name.clone(),
        }
    } else {
        PharmacyError::InsufficientStock {
            name: medicine.name.clone(),
            available: medicine.stock,
        }
    }
}
