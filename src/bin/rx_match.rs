use anyhow::Context;
use clap::Parser;
use smart_pharmacy::adapters::gemini::GeminiGateway;
use smart_pharmacy::config::toml_config::{AppConfig, CatalogConfig};
use smart_pharmacy::core::prescription::resolve_mime_type;
use smart_pharmacy::domain::model::{PrescriptionOutcome, PrescriptionReport};
use smart_pharmacy::utils::error::{ErrorSeverity, PharmacyError};
use smart_pharmacy::utils::{logger, validation::Validate};
use smart_pharmacy::{Cart, Catalog, PrescriptionService};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rx-match")]
#[command(about = "Read a prescription file and match it against the medicine catalog")]
struct Args {
    /// Prescription file (PDF, JPG or PNG)
    file: String,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override catalog.path from config
    #[arg(long)]
    catalog: Option<String>,

    /// Content type of the file; detected from its bytes when omitted
    #[arg(long)]
    mime_type: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Validate the file and configuration without calling the model
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load config file '{}'", path))?,
        None => AppConfig::default(),
    };
    if let Some(path) = &args.catalog {
        config.catalog = Some(CatalogConfig { path: path.clone() });
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let catalog = match config.catalog_path() {
        Some(path) => Catalog::from_toml_file(path)
            .with_context(|| format!("failed to load catalog '{}'", path))?,
        None => Catalog::sample(),
    };

    let file = std::fs::read(&args.file)
        .with_context(|| format!("failed to read prescription '{}'", args.file))?;
    tracing::info!("📁 Loaded {} ({} bytes)", args.file, file.len());

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - the model will not be called");
        let mime_type = resolve_mime_type(args.mime_type.as_deref(), &file);
        let accepted = config.upload.accepts(&mime_type);
        let fits = file.len() <= config.upload.max_size_bytes();
        println!("File:        {}", args.file);
        println!("Type:        {} ({})", mime_type, if accepted { "accepted" } else { "rejected" });
        println!("Size:        {} bytes ({})", file.len(), if fits { "ok" } else { "too large" });
        println!("Model:       {} at {}", config.gemini.model, config.gemini.endpoint);
        println!(
            "API key:     {}",
            if config.gemini.resolve_api_key().is_some() { "configured" } else { "missing" }
        );
        println!("Catalog:     {} medicines ({} in stock)", catalog.len(), catalog.in_stock().count());
        return Ok(());
    }

    let gateway = match GeminiGateway::new(&config.gemini) {
        Ok(gateway) => gateway,
        Err(e) => fail(e),
    };
    let service = PrescriptionService::new(Arc::new(catalog), Arc::new(gateway))
        .with_upload_policy(config.upload.clone())
        .with_options(config.matching);

    match service.process(&file, args.mime_type.as_deref()).await {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, service.catalog());
            }
        }
        Err(e) => fail(e),
    }

    Ok(())
}

fn print_report<'c>(report: &PrescriptionReport<'c>, catalog: &'c Catalog) {
    println!("✅ Prescription processed: {}", report.summary());

    if !report.result.matched.is_empty() {
        println!();
        println!("Added to cart ({}):", report.result.matched.len());
        for line in &report.result.matched {
            println!(
                "  {:<24} x{:<3} {:>8.2}",
                line.medicine.name,
                line.quantity,
                line.subtotal()
            );
        }
    }

    if !report.result.unmatched.is_empty() {
        println!();
        println!("Not available ({}):", report.result.unmatched.len());
        for mention in &report.result.unmatched {
            match mention.dosage() {
                Some(dosage) => println!("  {} {}", mention.name, dosage),
                None => println!("  {}", mention.name),
            }
        }
    }

    let mut cart = Cart::new(catalog);
    cart.merge_matched(&report.result.matched);
    println!();
    println!(
        "Cart total: {} items, {:.2}",
        cart.total_items(),
        cart.total_price()
    );

    match report.outcome {
        PrescriptionOutcome::EmptyExtraction => {
            println!("💡 No medicines were found on the prescription. Please select them manually.")
        }
        PrescriptionOutcome::NoMatchesFound => {
            println!("💡 None of the prescribed medicines are in stock. Please browse the catalog.")
        }
        PrescriptionOutcome::PartialMatch => {
            println!("💡 Some medicines are unavailable. You can pick alternatives from the catalog.")
        }
        PrescriptionOutcome::AllMatched => {}
    }
}

fn fail(e: PharmacyError) -> ! {
    tracing::error!(
        "❌ Prescription matching failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    if let PharmacyError::ModelResponseError { raw, .. } = &e {
        tracing::debug!("Raw model output: {}", raw);
    }
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
