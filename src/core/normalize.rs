/// 轉小寫並移除所有非 ASCII 英數字元
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Normalized name cut at its first digit, so "Losartan 50mg" becomes "losartan".
pub fn base_name(raw: &str) -> String {
    normalize(raw)
        .chars()
        .take_while(|c| !c.is_ascii_digit())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_symbols_and_case() {
        assert_eq!(normalize("Paracetamol 500mg"), "paracetamol500mg");
        assert_eq!(normalize("Vitamin D3 1000 IU"), "vitamind31000iu");
        assert_eq!(normalize("  Co-Amoxiclav (625 mg) "), "coamoxiclav625mg");
        assert_eq!(normalize("Ибупрофен"), "");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("---"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Paracetamol 500mg",
            "VITAMIN d3 1000 IU",
            "Café 20 µg",
            "  ",
            "Amoxicillin/Clavulanate",
            "日本語 10mg",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("Losartan 50mg"), "losartan");
        assert_eq!(base_name("Vitamin D3 1000 IU"), "vitamind");
        assert_eq!(base_name("Aspirin"), "aspirin");
        assert_eq!(base_name("500mg"), "");
    }
}
