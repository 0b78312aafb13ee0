use smart_pharmacy::domain::model::ExtractedMention;
use smart_pharmacy::{is_similar, normalize, reconcile, Catalog, ReconcileOptions, Reconciler};

fn sample_mentions() -> Vec<ExtractedMention> {
    vec![
        ExtractedMention::new("Paracetamol").with_dosage("500mg").with_quantity(2),
        ExtractedMention::new("Omeprazole").with_dosage("20mg"),
        ExtractedMention::new("Losartan").with_quantity(100),
        ExtractedMention::new("Unknown Drug"),
        ExtractedMention::new("Vitamin D3"),
        ExtractedMention::new("Ibuprofen"),
        ExtractedMention::new("Ibuprofen 400mg").with_quantity(3),
        ExtractedMention::new("Cetirizine"),
        ExtractedMention::new("Xylomet"),
    ]
}

#[test]
fn test_normalize_idempotent_over_catalog_and_mentions() {
    let catalog = Catalog::sample();
    let names = catalog
        .records()
        .iter()
        .map(|r| r.name.clone())
        .chain(sample_mentions().into_iter().map(|m| m.name));

    for name in names {
        let once = normalize(&name);
        assert_eq!(normalize(&once), once);
    }
}

#[test]
fn test_similarity_is_symmetric_over_catalog_names() {
    let catalog = Catalog::sample();
    let mut names: Vec<String> = catalog.records().iter().map(|r| r.name.clone()).collect();
    names.extend(sample_mentions().into_iter().map(|m| m.name));

    for a in &names {
        for b in &names {
            assert_eq!(is_similar(a, b), is_similar(b, a), "{a:?} vs {b:?}");
        }
    }
}

#[test]
fn test_named_examples() {
    assert!(is_similar("Paracetamol 500mg", "Paracetamol"));
    assert!(!is_similar("Losartan 50mg", "Atorvastatin 10mg"));

    let catalog = Catalog::sample();
    let record = catalog
        .find_match(&ExtractedMention::new("Paracetamol").with_dosage("500mg"))
        .unwrap();
    assert_eq!(record.name, "Paracetamol 500mg");
}

#[test]
fn test_out_of_stock_match_goes_to_unmatched() {
    let catalog = Catalog::sample();
    let omeprazole = ExtractedMention::new("Omeprazole");

    assert!(catalog.find_match(&omeprazole).is_some());

    let result = reconcile(&catalog, &[omeprazole.clone()]);
    assert!(result.matched.is_empty());
    assert_eq!(result.unmatched, vec![omeprazole]);
}

#[test]
fn test_known_and_unknown_mentions() {
    let catalog = Catalog::sample();
    let mentions = vec![
        ExtractedMention::new("Paracetamol").with_quantity(3),
        ExtractedMention::new("Unknown Drug"),
    ];

    let result = reconcile(&catalog, &mentions);

    assert_eq!(result.matched.len(), 1);
    assert_eq!(result.matched[0].medicine.name, "Paracetamol 500mg");
    assert_eq!(result.matched[0].quantity, 3);
    assert_eq!(result.unmatched, vec![ExtractedMention::new("Unknown Drug")]);
}

#[test]
fn test_quantity_clamped_to_stock() {
    let catalog = Catalog::sample();
    let result = reconcile(&catalog, &[ExtractedMention::new("Losartan").with_quantity(100)]);

    assert_eq!(result.matched.len(), 1);
    assert_eq!(result.matched[0].medicine.stock, 5);
    assert_eq!(result.matched[0].quantity, 5);
}

#[test]
fn test_empty_input() {
    let catalog = Catalog::sample();
    let result = reconcile(&catalog, &[]);
    assert!(result.matched.is_empty());
    assert!(result.unmatched.is_empty());
}

#[test]
fn test_every_mention_lands_in_exactly_one_bucket() {
    let catalog = Catalog::sample();
    let mentions = sample_mentions();

    let result = reconcile(&catalog, &mentions);

    assert_eq!(result.matched.len() + result.unmatched.len(), mentions.len());
    // 輸入順序保留
    let matched_ids: Vec<&str> = result.matched.iter().map(|l| l.medicine.id.as_str()).collect();
    assert_eq!(matched_ids, vec!["1", "5", "8", "8"]);
    let unmatched_names: Vec<&str> = result.unmatched.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        unmatched_names,
        vec!["Omeprazole", "Unknown Drug", "Vitamin D3", "Cetirizine", "Xylomet"]
    );
    assert!(result
        .matched
        .iter()
        .all(|l| l.quantity > 0 && l.quantity <= l.medicine.stock));
}

#[test]
fn test_merging_never_grows_the_result() {
    let catalog = Catalog::sample();
    let mentions = sample_mentions();

    let result = Reconciler::new(&catalog)
        .options(ReconcileOptions {
            merge_duplicates: true,
        })
        .reconcile(&mentions);

    assert!(result.matched.len() + result.unmatched.len() <= mentions.len());
    let ibuprofen: Vec<_> = result.matched.iter().filter(|l| l.medicine.id == "8").collect();
    assert_eq!(ibuprofen.len(), 1);
    assert_eq!(ibuprofen[0].quantity, 4);
}
