use clap::{Parser, Subcommand};
use lumen_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lumen")]
#[command(about = "IV drug compatibility and CVC/PICC lumen allocation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Drug database file (JSON); overrides the config file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Output language (it, en)
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate the selected drugs to catheter lumens
    Allocate {
        /// Drug ids or names, in order of clinical priority
        #[arg(required = true)]
        drugs: Vec<String>,

        /// Number of available lumens
        #[arg(long)]
        lumens: Option<u32>,

        /// Lumen types in index order (cvc, picc), comma separated
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,

        /// How to treat conflicting data (block, warn)
        #[arg(long)]
        policy: Option<String>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the compatibility status of two drugs
    Check { first: String, second: String },

    /// List drugs in the database
    Drugs {
        /// Filter by id or name
        #[arg(long)]
        query: Option<String>,

        /// Only drugs that require a CVC
        #[arg(long)]
        cvc: bool,

        /// Only photosensitive drugs
        #[arg(long)]
        photosensitive: bool,
    },

    /// Check the database for consistency problems
    Validate,

    /// Write a default config file
    InitConfig {
        /// Target path (defaults to --config or the standard location)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    lumen_core::logging::init(cli.verbose);

    let Cli {
        command,
        database,
        locale,
        config,
        ..
    } = cli;

    match command {
        Commands::Allocate {
            drugs,
            lumens,
            types,
            policy,
            json,
        } => {
            let (config, locale) = load_settings(config.as_deref(), locale.as_deref())?;
            let db = open_database(database, &config)?;
            cmd_allocate(db, &config, locale, drugs, lumens, types, policy, json)
        }
        Commands::Check { first, second } => {
            let (config, locale) = load_settings(config.as_deref(), locale.as_deref())?;
            let db = open_database(database, &config)?;
            cmd_check(db, locale, &first, &second)
        }
        Commands::Drugs {
            query,
            cvc,
            photosensitive,
        } => {
            let (config, locale) = load_settings(config.as_deref(), locale.as_deref())?;
            let db = open_database(database, &config)?;
            let filter = DrugFilter {
                query,
                cvc_required: cvc.then_some(true),
                photosensitive: photosensitive.then_some(true),
            };
            cmd_drugs(db, locale, &filter)
        }
        Commands::Validate => {
            let (config, _) = load_settings(config.as_deref(), locale.as_deref())?;
            let db = open_database(database, &config)?;
            cmd_validate(db)
        }
        // Does not read the existing config, so it can replace a broken one
        Commands::InitConfig { path, force } => {
            let path = path
                .or(config)
                .unwrap_or_else(Config::default_config_path);
            cmd_init_config(&path, force)
        }
    }
}

/// Load the config file and settle the output locale (flag beats file)
fn load_settings(config_path: Option<&Path>, locale: Option<&str>) -> Result<(Config, Locale)> {
    let config = match config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let locale = match locale {
        Some(l) => l.parse()?,
        None => config.locale,
    };
    Ok((config, locale))
}

fn open_database(cli_path: Option<PathBuf>, config: &Config) -> Result<&'static DrugDatabase> {
    match cli_path.or_else(|| config.database.path.clone()) {
        Some(path) => DrugDatabase::load_shared(&path),
        None => {
            tracing::debug!("No database configured, using built-in sample set");
            Ok(sample_database())
        }
    }
}

/// Map user input to database ids; unresolved entries pass through so they
/// surface as unknown-drug warnings
fn resolve_selection(db: &DrugDatabase, drugs: &[String]) -> Vec<String> {
    drugs
        .iter()
        .map(|d| match db.resolve(d) {
            Some(entry) => entry.id.clone(),
            None => d.clone(),
        })
        .collect()
}

fn drug_name(db: &DrugDatabase, id: &str, locale: Locale) -> String {
    db.drug(id)
        .map(|d| d.display_name(locale).to_string())
        .unwrap_or_else(|| id.to_string())
}

#[allow(clippy::too_many_arguments)]
fn cmd_allocate(
    db: &DrugDatabase,
    config: &Config,
    locale: Locale,
    drugs: Vec<String>,
    lumens: Option<u32>,
    types: Vec<String>,
    policy: Option<String>,
    json: bool,
) -> Result<()> {
    let types = if types.is_empty() {
        config.lumens.types.clone()
    } else {
        types
            .iter()
            .map(|t| t.parse())
            .collect::<Result<Vec<LumenType>>>()?
    };
    let configuration =
        LumenConfiguration::new(lumens.unwrap_or(config.lumens.count), types);
    let slots = configuration.slots()?;

    let options = PlanOptions {
        policy: match policy {
            Some(p) => p.parse()?,
            None => config.policy.conflicting_data,
        },
    };

    let selection = resolve_selection(db, &drugs);
    let plan = plan(db, &selection, &slots, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        display_plan(db, locale, &plan);
    }

    Ok(())
}

fn cmd_check(db: &DrugDatabase, locale: Locale, first: &str, second: &str) -> Result<()> {
    let [a, b] = [first, second].map(|d| match db.resolve(d) {
        Some(entry) => entry.id.clone(),
        None => d.to_string(),
    });

    let status = CompatibilityClassifier::new(db).classify(&a, &b);
    println!(
        "{} + {}: {}",
        drug_name(db, &a, locale),
        drug_name(db, &b, locale),
        status.label(locale)
    );

    Ok(())
}

fn cmd_drugs(db: &DrugDatabase, locale: Locale, filter: &DrugFilter) -> Result<()> {
    let drugs = db.search(filter);
    if drugs.is_empty() {
        println!("{}", labels(locale).no_results);
        return Ok(());
    }

    for drug in drugs {
        let mut flags = Vec::new();
        if drug.cvc_required {
            flags.push("CVC");
        }
        if drug.photosensitive {
            flags.push(labels(locale).photosensitive);
        }
        println!(
            "  {:<24} {:<28} {}",
            drug.id,
            drug.display_name(locale),
            flags.join(" ")
        );
    }

    Ok(())
}

fn cmd_validate(db: &DrugDatabase) -> Result<()> {
    let errors = db.validate();
    if !errors.is_empty() {
        eprintln!("Database validation errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Database(format!(
            "{} validation problem(s)",
            errors.len()
        )));
    }

    println!(
        "✓ Database valid: {} drugs, {} compatibility pairs",
        db.len(),
        db.pair_count()
    );
    Ok(())
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save_to(path)?;
    println!("✓ Wrote default config to {}", path.display());
    Ok(())
}

struct Labels {
    title: &'static str,
    lumen: &'static str,
    not_available: &'static str,
    light: &'static str,
    needed: &'static str,
    available: &'static str,
    sufficient: &'static str,
    insufficient: &'static str,
    warnings: &'static str,
    recommendations: &'static str,
    no_drugs: &'static str,
    no_results: &'static str,
    photosensitive: &'static str,
}

fn labels(locale: Locale) -> Labels {
    match locale {
        Locale::It => Labels {
            title: "ALLOCAZIONE LUMI CVC/PICC",
            lumen: "Lume",
            not_available: "NON DISPONIBILE",
            light: "fotoprotezione",
            needed: "Necessari",
            available: "Disponibili",
            sufficient: "✅ Sufficienti",
            insufficient: "❌ Insufficienti",
            warnings: "Avvisi",
            recommendations: "Raccomandazioni",
            no_drugs: "Nessun farmaco selezionato",
            no_results: "Nessun farmaco trovato",
            photosensitive: "Fotosensibile",
        },
        Locale::En => Labels {
            title: "CVC/PICC LUMEN ALLOCATION",
            lumen: "Lumen",
            not_available: "NOT AVAILABLE",
            light: "light protection",
            needed: "Needed",
            available: "Available",
            sufficient: "✅ Sufficient",
            insufficient: "❌ Insufficient",
            warnings: "Warnings",
            recommendations: "Recommendations",
            no_drugs: "No drugs selected",
            no_results: "No drug found",
            photosensitive: "Photosensitive",
        },
    }
}

fn warning_text(db: &DrugDatabase, locale: Locale, warning: &Warning) -> String {
    let name = |id: &str| drug_name(db, id, locale);

    match (warning, locale) {
        (Warning::HardConflict { drug_a, drug_b, lumen }, Locale::It) => format!(
            "INCOMPATIBILITÀ: {} + {} nel lume {}",
            name(drug_a),
            name(drug_b),
            lumen + 1
        ),
        (Warning::HardConflict { drug_a, drug_b, lumen }, Locale::En) => format!(
            "INCOMPATIBILITY: {} + {} in lumen {}",
            name(drug_a),
            name(drug_b),
            lumen + 1
        ),
        (Warning::YSiteRequired { drug_a, drug_b, lumen }, Locale::It) => format!(
            "{} + {} nel lume {}: compatibili solo tramite Y-site",
            name(drug_a),
            name(drug_b),
            lumen + 1
        ),
        (Warning::YSiteRequired { drug_a, drug_b, lumen }, Locale::En) => format!(
            "{} + {} in lumen {}: compatible only via Y-site",
            name(drug_a),
            name(drug_b),
            lumen + 1
        ),
        (Warning::NoCompatibilityData { drug_a, drug_b }, Locale::It) => format!(
            "Nessun dato di compatibilità per {} + {}",
            name(drug_a),
            name(drug_b)
        ),
        (Warning::NoCompatibilityData { drug_a, drug_b }, Locale::En) => format!(
            "No compatibility data for {} + {}",
            name(drug_a),
            name(drug_b)
        ),
        (Warning::ConflictingData { drug_a, drug_b }, Locale::It) => format!(
            "ATTENZIONE: Dati contrastanti per {} e {}",
            name(drug_a),
            name(drug_b)
        ),
        (Warning::ConflictingData { drug_a, drug_b }, Locale::En) => format!(
            "WARNING: Conflicting data for {} and {}",
            name(drug_a),
            name(drug_b)
        ),
        (Warning::TypeMismatch { drug }, Locale::It) => {
            format!("{} richiede un lume CVC: NON DISPONIBILE", name(drug))
        }
        (Warning::TypeMismatch { drug }, Locale::En) => {
            format!("{} requires a CVC lumen: NOT AVAILABLE", name(drug))
        }
        (Warning::UnknownDrug { drug }, Locale::It) => {
            format!("Farmaco sconosciuto '{}' ignorato", drug)
        }
        (Warning::UnknownDrug { drug }, Locale::En) => {
            format!("Unknown drug '{}' ignored", drug)
        }
    }
}

fn display_plan(db: &DrugDatabase, locale: Locale, plan: &LumenPlan) {
    let labels = labels(locale);
    let allocation = &plan.allocation;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", labels.title);
    println!("╰─────────────────────────────────────────╯");
    println!();

    if allocation.lumens.is_empty() && allocation.unallocated.is_empty() {
        println!("  {}", labels.no_drugs);
    }

    for lumen in &allocation.lumens {
        let kind = lumen
            .lumen_type
            .map(|t| format!(" ({})", t))
            .unwrap_or_default();
        let names: Vec<String> = lumen
            .assigned
            .iter()
            .map(|id| drug_name(db, id, locale))
            .collect();
        let light = if lumen.light_protection {
            format!("  [{}]", labels.light)
        } else {
            String::new()
        };
        println!(
            "  {} {}{}: {}{}",
            labels.lumen,
            lumen.index + 1,
            kind,
            names.join(", "),
            light
        );
    }

    for id in &allocation.unallocated {
        println!("  {}: {}", labels.not_available, drug_name(db, id, locale));
    }

    println!();
    let verdict = if allocation.deficit == 0 {
        labels.sufficient.to_string()
    } else {
        format!("{} (deficit {})", labels.insufficient, allocation.deficit)
    };
    println!(
        "  {}: {} | {}: {}  {}",
        labels.needed,
        allocation.lumens_needed(),
        labels.available,
        allocation.available,
        verdict
    );

    if !allocation.warnings.is_empty() {
        println!();
        println!("  {}:", labels.warnings);
        for warning in &allocation.warnings {
            println!("  ⚠ {}", warning_text(db, locale, warning));
        }
    }

    if !plan.recommendations.is_empty() {
        println!();
        println!("  {}:", labels.recommendations);
        for recommendation in &plan.recommendations {
            println!("  → {}", recommendation.text(locale));
        }
    }

    println!();
}
