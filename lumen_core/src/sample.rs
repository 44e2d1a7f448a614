//! Built-in sample drug database.
//!
//! A small intensive-care set used when no database file is configured and
//! throughout the tests. Statuses are illustrative only and must not be used
//! as a clinical reference.

use crate::types::*;
use crate::DrugDatabase;
use once_cell::sync::Lazy;

/// Cached sample database - built once and reused across all operations
static SAMPLE_DATABASE: Lazy<DrugDatabase> = Lazy::new(build_sample_database);

/// Get a reference to the cached sample database
pub fn sample_database() -> &'static DrugDatabase {
    &SAMPLE_DATABASE
}

fn drug(id: &str, it: &str, en: &str, photosensitive: bool, cvc_required: bool) -> DrugEntry {
    DrugEntry {
        id: id.into(),
        name: LocalizedText::new(it, en),
        photosensitive,
        cvc_required,
    }
}

/// Builds the sample database
///
/// **Note**: prefer `sample_database()`, which returns a cached reference.
pub fn build_sample_database() -> DrugDatabase {
    use CompatibilityStatus::*;

    let mut db = DrugDatabase::new();

    // ========================================================================
    // Drugs
    // ========================================================================

    for entry in [
        drug("noradrenalina", "Noradrenalina", "Norepinephrine", true, true),
        drug("vasopressina", "Vasopressina", "Vasopressin", false, false),
        drug("dobutamina", "Dobutamina", "Dobutamine", false, false),
        drug("propofol", "Propofol", "Propofol", false, false),
        drug("fentanil", "Fentanil", "Fentanyl", false, false),
        drug("midazolam", "Midazolam", "Midazolam", false, false),
        drug("furosemide", "Furosemide", "Furosemide", true, false),
        drug("eparina", "Eparina sodica", "Heparin sodium", false, false),
        drug("insulina", "Insulina rapida", "Regular insulin", false, false),
        drug("amiodarone", "Amiodarone", "Amiodarone", true, true),
        drug("pantoprazolo", "Pantoprazolo", "Pantoprazole", false, false),
        drug(
            "nutrizione-parenterale",
            "Nutrizione parenterale",
            "Parenteral nutrition",
            true,
            true,
        ),
        drug("potassio-cloruro", "Potassio cloruro", "Potassium chloride", false, true),
    ] {
        db.insert_drug(entry);
    }

    // ========================================================================
    // Compatibility pairs
    // ========================================================================

    let pairs = [
        // Vasopressors
        ("noradrenalina", "vasopressina", Compatible),
        ("noradrenalina", "dobutamina", Compatible),
        ("noradrenalina", "insulina", YSiteOnly),
        ("noradrenalina", "propofol", YSiteOnly),
        ("noradrenalina", "fentanil", Compatible),
        ("noradrenalina", "midazolam", Compatible),
        ("noradrenalina", "furosemide", Incompatible),
        ("noradrenalina", "eparina", YSiteOnly),
        ("noradrenalina", "amiodarone", Compatible),
        ("noradrenalina", "pantoprazolo", Incompatible),
        ("vasopressina", "fentanil", Compatible),
        ("vasopressina", "propofol", Compatible),
        ("dobutamina", "furosemide", Incompatible),
        ("dobutamina", "eparina", YSiteOnly),
        // Sedation
        ("propofol", "fentanil", Compatible),
        ("propofol", "midazolam", ConflictingData),
        ("propofol", "amiodarone", YSiteOnly),
        ("midazolam", "fentanil", Compatible),
        ("midazolam", "furosemide", Incompatible),
        ("midazolam", "pantoprazolo", Incompatible),
        // Diuretics, anticoagulants, antiarrhythmics
        ("furosemide", "amiodarone", Incompatible),
        ("furosemide", "eparina", Compatible),
        ("furosemide", "potassio-cloruro", Compatible),
        ("eparina", "amiodarone", Incompatible),
        ("insulina", "amiodarone", ConflictingData),
        ("pantoprazolo", "amiodarone", Incompatible),
        ("potassio-cloruro", "amiodarone", Compatible),
        // Parenteral nutrition
        ("nutrizione-parenterale", "midazolam", Incompatible),
        ("nutrizione-parenterale", "amiodarone", Incompatible),
        ("nutrizione-parenterale", "insulina", Compatible),
        ("nutrizione-parenterale", "eparina", YSiteOnly),
        ("nutrizione-parenterale", "fentanil", ConflictingData),
    ];

    for (a, b, status) in pairs {
        db.insert_pair(a, b, status);
    }

    db
}
