//! Incident report from the ticketing system's JSON export.

use chrono::NaiveDate;
use regex::Regex;
use tracing::info;

use crate::conf::C_INCIDENT_UNSPECIFIED;
use crate::error::ReportError;
use crate::spec::{
    SpecIncidentCategories, SpecIncidentConfig, SpecIncidentDocument, SpecIncidentRecord,
    SpecIncidentStatistics,
};
use crate::util::{derive_today_local, format_date, truncate_text};

const C_PATTERN_DESCRIPTION: &str = r"Descrição:(.+?)(?:\r\n|\n|$)";
const C_NUMBER_UNKNOWN: &str = "Número Desconhecido";
const C_SECTION_EMPTY: &str = "* *Quantidade:* 0\n* *Funcionalidades:*\n* *Responsáveis:*";

/// Parse the `{ "records": [...] }` export.
pub fn parse_incident_document(c_json: &str) -> Result<SpecIncidentDocument, ReportError> {
    Ok(serde_json::from_str(c_json)?)
}

////////////////////////////////////////////////////////////////////////////////
// #region Categorize

/// Group incidents by report section.
///
/// `vip` anywhere in the descriptions wins over the priority; otherwise
/// priority 3/4/5 map to critical/high/specific and other priorities are left out.
pub fn categorize_incidents(records: &[SpecIncidentRecord]) -> SpecIncidentCategories {
    let mut categories = SpecIncidentCategories::default();
    for rec in records {
        if is_vip_incident(rec) {
            categories.vip.push(rec.clone());
            continue;
        }
        match rec.priority_text().as_deref() {
            Some("3") => categories.critical.push(rec.clone()),
            Some("4") => categories.high.push(rec.clone()),
            Some("5") => categories.specific.push(rec.clone()),
            _ => {}
        }
    }
    categories
}

fn is_vip_incident(rec: &SpecIncidentRecord) -> bool {
    [&rec.description, &rec.short_description]
        .into_iter()
        .flatten()
        .any(|c_text| c_text.to_lowercase().contains("vip"))
}

/// Per-category counts plus the total.
pub fn derive_incident_statistics(records: &[SpecIncidentRecord]) -> SpecIncidentStatistics {
    let categories = categorize_incidents(records);
    let mut stats = SpecIncidentStatistics {
        critical: categories.critical.len(),
        high: categories.high.len(),
        specific: categories.specific.len(),
        vip: categories.vip.len(),
        total: 0,
    };
    stats.total = stats.critical + stats.high + stats.specific + stats.vip;
    stats
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Render

/// Affected functionality of an incident.
///
/// Short description first; then the `Descrição:` line of the description;
/// then the description's first CRLF line (or its first 70 characters).
pub fn extract_functionality(rec: &SpecIncidentRecord, re_description: &Regex) -> String {
    let c_short = rec.short_description.as_deref().unwrap_or("");
    let c_description = rec.description.as_deref().unwrap_or("");

    let c_text = if !c_short.is_empty() {
        c_short.to_string()
    } else if !c_description.is_empty() {
        match re_description.captures(c_description).and_then(|caps| caps.get(1)) {
            Some(m) => m.as_str().trim().to_string(),
            None => match c_description.split_once("\r\n") {
                Some((c_first, _)) => c_first.to_string(),
                None => c_description.chars().take(70).collect(),
            },
        }
    } else {
        String::new()
    };

    let c_trimmed = c_text.trim();
    if c_trimmed.is_empty() {
        C_INCIDENT_UNSPECIFIED.to_string()
    } else {
        c_trimmed.to_string()
    }
}

/// `DD/MM/YYYY – <shift>`.
pub fn format_period(date: NaiveDate, cfg: &SpecIncidentConfig) -> String {
    format!("{} – {}", format_date(date), cfg.shift)
}

fn format_section(
    records: &[SpecIncidentRecord],
    cfg: &SpecIncidentConfig,
    re_description: &Regex,
) -> String {
    if records.is_empty() {
        return C_SECTION_EMPTY.to_string();
    }
    let c_items: String = records
        .iter()
        .map(|rec| {
            let c_number = rec.number.as_deref().unwrap_or(C_NUMBER_UNKNOWN);
            let c_func = truncate_text(&extract_functionality(rec, re_description), cfg.n_len_text_max);
            format!("\n    * {c_number} - {c_func}")
        })
        .collect();
    format!(
        "* *Quantidade:* {}\n* *Funcionalidades:* {c_items}\n* *Responsáveis:* {}",
        records.len(),
        cfg.owner
    )
}

/// Render the report for `date`.
pub fn render_incident_report(
    doc: &SpecIncidentDocument,
    date: NaiveDate,
    cfg: &SpecIncidentConfig,
) -> Result<String, ReportError> {
    let re_description =
        Regex::new(C_PATTERN_DESCRIPTION).map_err(|err| ReportError::Pattern(err.to_string()))?;
    let categories = categorize_incidents(&doc.records);
    let section = |records: &[SpecIncidentRecord]| format_section(records, cfg, &re_description);

    Ok(format!(
        "*Relatório de Incidentes QD APPs*\n\n*Período:* {}\n\n*1. Incidentes Críticos*\n{}\n\n*2. Incidentes Altos*\n{}\n\n*3. Incidentes Específicos*\n{}\n\n*4- Incidentes VIPS*\n{}\n\n*Observações*\n\nAtt.\nQd Spread\n",
        format_period(date, cfg),
        section(&categories.critical),
        section(&categories.high),
        section(&categories.specific),
        section(&categories.vip),
    ))
}

/// Parse the export and render the report for `date` (default: today).
pub fn generate_incident_report(
    c_json: &str,
    date: Option<NaiveDate>,
    cfg: &SpecIncidentConfig,
) -> Result<String, ReportError> {
    let doc = parse_incident_document(c_json)?;
    let date = date.unwrap_or_else(derive_today_local);
    let stats = derive_incident_statistics(&doc.records);
    info!(
        date = %date,
        critical = stats.critical,
        high = stats.high,
        specific = stats.specific,
        vip = stats.vip,
        "incident report rendered"
    );
    render_incident_report(&doc, date, cfg)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
