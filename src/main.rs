use clap::Parser;
use pepcalc::config::cli::{BatchArgs, CalcArgs, CatalogAction, Command};
use pepcalc::config::toml_config::OUTPUT_FORMATS;
use pepcalc::core::format::{format_advisories, format_report};
use pepcalc::domain::ports::PeptideCatalog;
use pepcalc::utils::error::{ErrorSeverity, PepcalcError, Result};
use pepcalc::utils::validation::{validate_one_of, validate_required_field, Validate};
use pepcalc::utils::logger;
use pepcalc::{
    run_calculation, AppConfig, BatchEngine, CliConfig, CsvBatchPipeline, LocalStorage,
    TomlCatalog,
};

fn main() {
    let cli = CliConfig::parse();

    // 載入設定檔（不存在時使用預設值）
    let app_config = match AppConfig::load_optional(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file is valid TOML format");
            std::process::exit(1);
        }
    };

    if cli.log_json || app_config.json_logging() {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = app_config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let result = match &cli.command {
        Command::Calc(args) => run_calc(args, &app_config),
        Command::Batch(args) => run_batch(args, &app_config),
        Command::Catalog { action } => run_catalog(action, &app_config),
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ pepcalc failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

fn load_catalog(path: Option<&str>) -> Result<Option<TomlCatalog>> {
    match path {
        Some(path) => {
            tracing::info!("📚 Loading peptide catalog from: {}", path);
            Ok(Some(TomlCatalog::from_file(path)?))
        }
        None => Ok(None),
    }
}

fn run_calc(args: &CalcArgs, app_config: &AppConfig) -> Result<()> {
    let calc_config = app_config.calculator_config(args.syringe)?;
    let format = args
        .format
        .as_deref()
        .unwrap_or_else(|| app_config.output_format());
    validate_one_of("format", format, &OUTPUT_FORMATS)?;

    let catalog = load_catalog(args.catalog.as_deref().or(app_config.catalog_path()))?;
    let outcome = run_calculation(
        &args.raw_input(),
        &calc_config,
        catalog.as_ref().map(|c| c as &dyn PeptideCatalog),
        args.reconstituted_on,
    )?;

    tracing::debug!("Report: {:?}", outcome.report);
    for advisory in &outcome.advisories {
        tracing::warn!("⚠️ {}", advisory);
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("{}", format_report(&outcome.input, &outcome.report, &calc_config));
    if let Some(expires_on) = outcome.expires_on {
        println!("Reconstituted solution expires on: {}", expires_on);
    }
    if !outcome.advisories.is_empty() {
        println!("WARNINGS:");
        println!("{}", format_advisories(&outcome.advisories));
    }
    Ok(())
}

fn run_batch(args: &BatchArgs, app_config: &AppConfig) -> Result<()> {
    let calc_config = app_config.calculator_config(args.syringe)?;
    let catalog = load_catalog(args.catalog.as_deref().or(app_config.catalog_path()))?;

    // 路徑可為相對或絕對路徑
    let storage = LocalStorage::new(".".to_string());
    let mut pipeline = CsvBatchPipeline::new(
        storage,
        args.input.clone(),
        args.output.clone(),
        args.format,
        calc_config,
    );
    if let Some(catalog) = catalog.as_ref() {
        pipeline = pipeline.with_catalog(catalog);
    }

    let summary = BatchEngine::new(pipeline).run()?;
    println!(
        "✅ Processed {} rows ({} ok, {} rejected)",
        summary.rows, summary.succeeded, summary.failed
    );
    println!("📁 Output saved to: {}", summary.output_path);
    Ok(())
}

fn run_catalog(action: &CatalogAction, app_config: &AppConfig) -> Result<()> {
    let (path, name) = match action {
        CatalogAction::List { catalog } => (catalog.clone(), None),
        CatalogAction::Show { name, catalog } => (catalog.clone(), Some(name)),
    };
    let path = path.or_else(|| app_config.catalog_path().map(str::to_string));
    let path = validate_required_field("catalog.path", &path)?;
    let catalog = TomlCatalog::from_file(path)?;

    match name {
        None => {
            if catalog.is_empty() {
                println!("⚠ No peptides in catalog {}", path);
            }
            for (i, p) in catalog.profiles().iter().enumerate() {
                let range = p
                    .typical_range()
                    .map(|(min, max)| format!("{}-{} mcg", min, max))
                    .unwrap_or_else(|| "N/A".to_string());
                println!("{}. {} (typical dose: {})", i + 1, p.name, range);
            }
        }
        Some(name) => {
            let profile = catalog.find(name).ok_or_else(|| PepcalcError::CatalogError {
                message: format!("Peptide '{}' not found", name),
            })?;
            println!("{}", toml::to_string_pretty(profile).map_err(|e| {
                PepcalcError::CatalogError {
                    message: e.to_string(),
                }
            })?);
        }
    }
    Ok(())
}
