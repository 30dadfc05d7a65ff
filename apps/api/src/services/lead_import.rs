//! CSV lead ingestion
//!
//! Headers are matched loosely (`First Name`, `first_name` and `firstName`
//! are the same column). Every data row is imported on its own, so one bad
//! row never blocks the rest of the file.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::lead::{Email, Lead, PhoneNumber};
use crate::domain::repositories::LeadRepository;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV has no phone column (expected one of: phone, number, telephone, mobile)")]
    MissingPhoneColumn,

    #[error("Unreadable CSV: {0}")]
    Malformed(String),
}

/// Outcome of one import, returned to the caller as-is
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub imported: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// A data row that could not become a lead
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line in the file; the header is line 1
    pub line: u64,
    pub reason: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.line, self.reason)
    }
}

/// A data row that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct LeadRow {
    pub line: u64,
    pub phone: PhoneNumber,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Email>,
    pub custom_fields: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Phone,
    FirstName,
    LastName,
    Name,
    Email,
}

impl Field {
    fn from_header(header: &str) -> Option<Self> {
        match canonical_header(header).as_str() {
            "phone" | "number" | "telephone" | "phonenumber" | "mobile" => Some(Field::Phone),
            "firstname" | "first" => Some(Field::FirstName),
            "lastname" | "last" | "surname" => Some(Field::LastName),
            "name" | "fullname" => Some(Field::Name),
            "email" | "emailaddress" => Some(Field::Email),
            _ => None,
        }
    }
}

/// Lowercase with `_`, `-` and spaces removed
fn canonical_header(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Column positions resolved from the header row
#[derive(Debug)]
struct Columns {
    phone: usize,
    first_name: Option<usize>,
    last_name: Option<usize>,
    name: Option<usize>,
    email: Option<usize>,
    extra: Vec<(usize, String)>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, ImportError> {
        let mut phone = None;
        let mut first_name = None;
        let mut last_name = None;
        let mut name = None;
        let mut email = None;
        let mut extra = Vec::new();

        for (index, header) in headers.iter().enumerate() {
            let slot = match Field::from_header(header) {
                Some(Field::Phone) => &mut phone,
                Some(Field::FirstName) => &mut first_name,
                Some(Field::LastName) => &mut last_name,
                Some(Field::Name) => &mut name,
                Some(Field::Email) => &mut email,
                None => {
                    let key = header.trim().trim_start_matches('\u{feff}');
                    if !key.is_empty() {
                        extra.push((index, key.to_string()));
                    }
                    continue;
                }
            };
            // first matching column wins
            if slot.is_none() {
                *slot = Some(index);
            }
        }

        Ok(Self {
            phone: phone.ok_or(ImportError::MissingPhoneColumn)?,
            first_name,
            last_name,
            name,
            email,
            extra,
        })
    }

    fn lead_row(&self, line: u64, record: &StringRecord) -> Result<LeadRow, RowError> {
        let fail = |reason: String| RowError { line, reason };

        let raw_phone =
            value(record, Some(self.phone)).ok_or_else(|| fail("missing phone number".into()))?;
        let phone = PhoneNumber::parse(raw_phone).map_err(|e| fail(e.to_string()))?;

        let mut first_name = value(record, self.first_name).map(str::to_string);
        let mut last_name = value(record, self.last_name).map(str::to_string);
        if first_name.is_none() && last_name.is_none() {
            if let Some(full) = value(record, self.name) {
                let (first, rest) = split_name(full);
                first_name = first;
                last_name = rest;
            }
        }

        let email = value(record, self.email).and_then(|raw| match Email::new(raw) {
            Ok(email) => Some(email),
            Err(e) => {
                tracing::warn!(line, error = %e, "Dropping invalid email");
                None
            }
        });

        let custom_fields = self
            .extra
            .iter()
            .filter_map(|(index, key)| {
                value(record, Some(*index)).map(|v| (key.clone(), Value::String(v.to_string())))
            })
            .collect();

        Ok(LeadRow {
            line,
            phone,
            first_name,
            last_name,
            email,
            custom_fields,
        })
    }
}

/// Trimmed, non-empty cell; short rows read as empty
fn value(record: &StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// "Mary Ann Smith" -> ("Mary", "Ann Smith")
fn split_name(full: &str) -> (Option<String>, Option<String>) {
    let mut parts = full.trim().splitn(2, ' ');
    let first = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    let rest = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    (first, rest)
}

/// Parses a CSV file into validated rows and row errors, in file order
///
/// Fails as a whole only when the header is unreadable or has no phone
/// column. Blank rows are skipped and not counted.
pub fn parse_leads(data: &[u8]) -> Result<Vec<Result<LeadRow, RowError>>, ImportError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| ImportError::Malformed(e.to_string()))?
        .clone();
    let columns = Columns::resolve(&headers)?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // header is line 1, so the n-th record starts at line n + 2 at the earliest
        let fallback_line = index as u64 + 2;
        match record {
            Ok(record) => {
                if record.iter().all(|cell| cell.trim().is_empty()) {
                    continue;
                }
                let line = record.position().map_or(fallback_line, |p| p.line());
                rows.push(columns.lead_row(line, &record));
            }
            Err(e) => {
                let line = e.position().map_or(fallback_line, |p| p.line());
                rows.push(Err(RowError {
                    line,
                    reason: e.to_string(),
                }));
            }
        }
    }

    Ok(rows)
}

/// Imports CSV files into an organization's leads
pub struct LeadImporter {
    leads: Arc<dyn LeadRepository>,
}

impl LeadImporter {
    pub fn new(leads: Arc<dyn LeadRepository>) -> Self {
        Self { leads }
    }

    /// Upserts every valid row, keyed on organization and phone
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn import(
        &self,
        organization_id: Uuid,
        campaign_id: Option<Uuid>,
        data: &[u8],
    ) -> Result<ImportSummary, ImportError> {
        let rows = parse_leads(data)?;
        let mut summary = ImportSummary {
            total_rows: rows.len(),
            ..ImportSummary::default()
        };

        for row in rows {
            let outcome = match row {
                Ok(row) => self.store(organization_id, campaign_id, row).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => summary.imported += 1,
                Err(e) => summary.errors.push(e.to_string()),
            }
        }
        summary.failed = summary.errors.len();

        tracing::info!(
            total_rows = summary.total_rows,
            imported = summary.imported,
            failed = summary.failed,
            "Lead import finished"
        );
        Ok(summary)
    }

    async fn store(
        &self,
        organization_id: Uuid,
        campaign_id: Option<Uuid>,
        row: LeadRow,
    ) -> Result<(), RowError> {
        let line = row.line;
        let lead = Lead::new(
            organization_id,
            campaign_id,
            row.phone,
            row.first_name,
            row.last_name,
            row.email,
            row.custom_fields,
        );

        self.leads.upsert(&lead).await.map(|_| ()).map_err(|e| {
            tracing::warn!(line, error = %e, "Failed to store lead");
            RowError {
                line,
                reason: e.to_string(),
            }
        })
    }
}
