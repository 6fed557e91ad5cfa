//! Provider code tables (PSR types, document status, business types, ...).

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::Deserialize;

const CODES_JSON: &str = include_str!("../data/codes.json");

static TABLES: OnceLock<CodeTables> = OnceLock::new();

/// Code-to-label tables published with the transparency API.
#[derive(Debug, Deserialize)]
pub struct CodeTables {
    psr_types: BTreeMap<String, String>,
    doc_status: BTreeMap<String, String>,
    business_types: BTreeMap<String, String>,
    market_agreement_types: BTreeMap<String, String>,
    document_types: BTreeMap<String, String>,
    process_types: BTreeMap<String, String>,
}

impl CodeTables {
    /// Returns the global code tables.
    #[must_use]
    pub fn global() -> &'static Self {
        TABLES.get_or_init(|| serde_json::from_str(CODES_JSON).expect("Invalid codes.json"))
    }

    /// Returns all PSR (production type) codes and labels.
    #[must_use]
    pub const fn psr_types(&self) -> &BTreeMap<String, String> {
        &self.psr_types
    }

    /// Resolves a PSR type given either its code (`B16`) or label (`Solar`).
    #[must_use]
    pub fn psr_code(&self, code_or_label: &str) -> Option<&str> {
        if let Some((code, _)) = self.psr_types.get_key_value(&code_or_label.to_uppercase()) {
            return Some(code);
        }
        self.psr_types
            .iter()
            .find(|(_, label)| label.eq_ignore_ascii_case(code_or_label))
            .map(|(code, _)| code.as_str())
    }
}

fn label<'a>(table: &'a BTreeMap<String, String>, code: &str) -> Option<&'a str> {
    table.get(code).map(String::as_str)
}

/// Label of a production type code (e.g. `B16` → `Solar`).
#[must_use]
pub fn psr_type(code: &str) -> Option<&'static str> {
    label(&CodeTables::global().psr_types, code)
}

/// Label of a document status code (e.g. `A13` → `Withdrawn`).
#[must_use]
pub fn doc_status(code: &str) -> Option<&'static str> {
    label(&CodeTables::global().doc_status, code)
}

/// Label of a business type code.
#[must_use]
pub fn business_type(code: &str) -> Option<&'static str> {
    label(&CodeTables::global().business_types, code)
}

/// Label of a market agreement type code.
#[must_use]
pub fn market_agreement_type(code: &str) -> Option<&'static str> {
    label(&CodeTables::global().market_agreement_types, code)
}

/// Label of a document type code.
#[must_use]
pub fn document_type(code: &str) -> Option<&'static str> {
    label(&CodeTables::global().document_types, code)
}

/// Label of a process type code.
#[must_use]
pub fn process_type(code: &str) -> Option<&'static str> {
    label(&CodeTables::global().process_types, code)
}
