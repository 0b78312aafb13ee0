use crate::core::matcher::SimilarityMatcher;
use crate::core::normalize::normalize;
use crate::domain::model::{ExtractedMention, MedicineRecord};
use crate::domain::ports::NameMatcher;
use crate::utils::error::{PharmacyError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Read-only medicine catalog, built once at startup and shared by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    records: Vec<MedicineRecord>,
}

#[derive(Deserialize)]
struct CatalogFile {
    medicines: Vec<MedicineRecord>,
}

impl Catalog {
    pub fn new(records: Vec<MedicineRecord>) -> Result<Self> {
        let mut ids = HashSet::new();
        for record in &records {
            if record.id.trim().is_empty() || record.name.trim().is_empty() {
                return Err(PharmacyError::ValidationError {
                    message: format!("catalog record '{}' must have an id and a name", record.id),
                });
            }
            if !record.price.is_finite() || record.price < 0.0 {
                return Err(PharmacyError::ValidationError {
                    message: format!(
                        "catalog record '{}' has invalid price {}",
                        record.id, record.price
                    ),
                });
            }
            if !ids.insert(record.id.as_str()) {
                return Err(PharmacyError::ValidationError {
                    message: format!("duplicate catalog id '{}'", record.id),
                });
            }
        }
        Ok(Self { records })
    }

    /// 內建的 12 項示範目錄
    pub fn sample() -> Self {
        let records = vec![
            MedicineRecord::new("1", "Paracetamol 500mg", 20.0, "strip", 50),
            MedicineRecord::new("2", "Amoxicillin 250mg", 35.0, "strip", 30),
            MedicineRecord::new("3", "Omeprazole 20mg", 45.0, "strip", 0),
            MedicineRecord::new("4", "Metformin 500mg", 30.0, "strip", 25),
            MedicineRecord::new("5", "Losartan 50mg", 50.0, "strip", 5),
            MedicineRecord::new("6", "Atorvastatin 10mg", 55.0, "strip", 40),
            MedicineRecord::new("7", "Cetirizine 10mg", 15.0, "strip", 0),
            MedicineRecord::new("8", "Ibuprofen 400mg", 25.0, "strip", 60),
            MedicineRecord::new("9", "Ranitidine 150mg", 18.0, "strip", 3),
            MedicineRecord::new("10", "Ciprofloxacin 500mg", 60.0, "strip", 20),
            MedicineRecord::new("11", "Aspirin 75mg", 12.0, "strip", 45),
            MedicineRecord::new("12", "Vitamin D3 1000 IU", 40.0, "bottle", 0),
        ];
        Self { records }
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PharmacyError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses `[[medicines]]` tables.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| PharmacyError::ConfigValidationError {
                field: "catalog".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        Self::new(file.medicines)
    }

    pub fn records(&self) -> &[MedicineRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&MedicineRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn in_stock(&self) -> impl Iterator<Item = &MedicineRecord> {
        self.records.iter().filter(|r| r.is_in_stock())
    }

    /// Case-insensitive substring search over names; a blank query lists everything.
    pub fn search(&self, query: &str) -> Vec<&MedicineRecord> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.records.iter().collect();
        }
        self.records
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&query))
            .collect()
    }

    pub fn find_match(&self, mention: &ExtractedMention) -> Option<&MedicineRecord> {
        self.find_match_with(mention, &SimilarityMatcher)
    }

    /// Resolves a mention to the first similar record in catalog order.
    ///
    /// The name plus dosage is tried first, then the bare name. Names with
    /// nothing comparable after normalization (e.g. non-Latin script) never match.
    pub fn find_match_with<M: NameMatcher + ?Sized>(
        &self,
        mention: &ExtractedMention,
        matcher: &M,
    ) -> Option<&MedicineRecord> {
        if normalize(&mention.name).is_empty() {
            tracing::debug!("No comparable characters in '{}', skipping match", mention.name);
            return None;
        }

        let query = match mention.dosage() {
            Some(dosage) => format!("{} {}", mention.name, dosage),
            None => mention.name.clone(),
        };

        self.first_similar(&query, matcher)
            .or_else(|| self.first_similar(&mention.name, matcher))
    }

    fn first_similar<M: NameMatcher + ?Sized>(
        &self,
        query: &str,
        matcher: &M,
    ) -> Option<&MedicineRecord> {
        self.records
            .iter()
            .find(|record| matcher.matches(query, &record.name))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sample_catalog_is_valid() {
        let sample = Catalog::sample();
        assert_eq!(sample.len(), 12);
        assert!(Catalog::new(sample.records().to_vec()).is_ok());
        assert_eq!(sample.in_stock().count(), 9);
    }

    #[test]
    fn test_find_match_uses_dosage_first() {
        let catalog = Catalog::sample();
        let mention = ExtractedMention::new("Paracetamol").with_dosage("500mg");
        let record = catalog.find_match(&mention).unwrap();
        assert_eq!(record.name, "Paracetamol 500mg");
    }

    #[test]
    fn test_find_match_with_different_strength() {
        let catalog = Catalog::sample();
        // 劑量不同，靠主成分名稱比對
        let mention = ExtractedMention::new("Atorvastatin").with_dosage("20 mg");
        let record = catalog.find_match(&mention).unwrap();
        assert_eq!(record.id, "6");
    }

    #[test]
    fn test_find_match_falls_back_to_bare_name() {
        let catalog = Catalog::sample();
        // "losartantablet" 對不上任何品項，第二輪只用名稱
        let mention = ExtractedMention::new("Losartan").with_dosage("tablet");
        let record = catalog.find_match(&mention).unwrap();
        assert_eq!(record.id, "5");
    }

    #[test]
    fn test_find_match_out_of_stock_record_is_still_found() {
        let catalog = Catalog::sample();
        let record = catalog.find_match(&ExtractedMention::new("Omeprazole")).unwrap();
        assert_eq!(record.id, "3");
        assert_eq!(record.stock, 0);
    }

    #[test]
    fn test_find_match_none() {
        let catalog = Catalog::sample();
        assert!(catalog.find_match(&ExtractedMention::new("Unknown Drug")).is_none());
    }

    #[test]
    fn test_find_match_ignores_names_without_comparable_characters() {
        let catalog = Catalog::sample();
        assert!(catalog.find_match(&ExtractedMention::new("Ибупрофен")).is_none());
        // 劑量本身有英數字也不能讓空名稱配對
        let mention = ExtractedMention::new("アスピリン").with_dosage("75mg");
        assert!(catalog.find_match(&mention).is_none());
    }

    #[test]
    fn test_catalog_order_breaks_ties() {
        let catalog = Catalog::new(vec![
            MedicineRecord::new("a", "Amoxicillin 250mg", 35.0, "strip", 10),
            MedicineRecord::new("b", "Amoxicillin 500mg", 50.0, "strip", 10),
        ])
        .unwrap();
        let record = catalog.find_match(&ExtractedMention::new("Amoxicillin")).unwrap();
        assert_eq!(record.id, "a");

        // 主成分相同時不比較劑量，先出現者勝出
        let record = catalog
            .find_match(&ExtractedMention::new("Amoxicillin").with_dosage("500mg"))
            .unwrap();
        assert_eq!(record.id, "a");
    }

    #[test]
    fn test_search() {
        let catalog = Catalog::sample();
        assert_eq!(catalog.search("").len(), 12);
        assert_eq!(catalog.search("   ").len(), 12);
        let hits = catalog.search("MG");
        assert_eq!(hits.len(), 11);
        let hits = catalog.search("cipro");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "10");
        assert!(catalog.search("insulin").is_empty());
    }

    #[test]
    fn test_rejects_duplicate_ids_and_bad_prices() {
        let dup = Catalog::new(vec![
            MedicineRecord::new("1", "A", 1.0, "strip", 1),
            MedicineRecord::new("1", "B", 1.0, "strip", 1),
        ]);
        assert!(dup.is_err());

        let negative = Catalog::new(vec![MedicineRecord::new("1", "A", -1.0, "strip", 1)]);
        assert!(negative.is_err());

        let unnamed = Catalog::new(vec![MedicineRecord::new("1", " ", 1.0, "strip", 1)]);
        assert!(unnamed.is_err());
    }

    #[test]
    fn test_catalog_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let toml_content = r#"
[[medicines]]
id = "m1"
name = "Salbutamol Inhaler 100mcg"
price = 250.0
unit = "inhaler"
stock = 4

[[medicines]]
id = "m2"
name = "Zinc 20mg"
price = 8.5
unit = "strip"
stock = 0
"#;
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let catalog = Catalog::from_toml_file(temp_file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("m1").unwrap().unit, "inhaler");
        assert!(catalog.get("m3").is_none());
    }
}
