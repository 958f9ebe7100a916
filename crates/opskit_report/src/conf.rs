//! Business constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{
    SpecChgReportConfig, SpecColumnRules, SpecIncidentConfig, SpecMergeConfig,
    SpecOccurrencesConfig, SpecStatusColors, SpecStatusRules,
};

////////////////////////////////////////////////////////////////////////////////
// #region Clock

/// UTC offset of `America/Sao_Paulo` (no daylight saving since 2019).
pub const N_SECS_OFFSET_SAO_PAULO_WEST: i32 = 3 * 3600;
/// Date layout used in every sheet and report (`DD/MM/YYYY`).
pub const C_FMT_DATE: &str = "%d/%m/%Y";
/// Date-time layout used in CHG blocks.
pub const C_FMT_DATETIME: &str = "%d/%m/%Y %H:%M";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TestMerge

/// Canonical column that carries the test status.
pub const C_COL_STATUS: &str = "Status";
/// Synthetic date column prepended to every merged row.
pub const C_COL_DATE: &str = "Data";
/// Destination sheet of the daily tracking workbook.
pub const C_SHEET_DESTINATION: &str = "B2C";
/// Notebook sheets merged by default, in read order.
pub const TUP_SHEETS_NOTEBOOK: [&str; 2] = ["Caderno App Vivo", "Caderno Web B2C"];

/// Terms that exclude a row when contained in its status (case-insensitive).
pub const TUP_STATUS_EXCLUDED: [&str; 2] = ["a validar", "validar"];

/// Source column aliases: `(name seen in notebooks, canonical name)`.
pub const TUP_COLUMN_ALIASES: [(&str, &str); 7] = [
    ("Status", C_COL_STATUS),
    ("Status do Teste QD", C_COL_STATUS),
    ("Status de Teste", C_COL_STATUS),
    ("N° INC", "N° INC"),
    ("Notas QD", "Observação"),
    ("Obervação", "Observação"),
    ("Observação", "Observação"),
];

/// Columns dropped after renaming.
pub const TUP_COLUMNS_IGNORED: [&str; 4] = ["ID Fluxo", "Planejamento", "Prioridade", "Obervação"];

/// Expected header of the `B2C` sheet.
pub const TUP_COLUMNS_DESTINATION: [&str; 13] = [
    C_COL_DATE,
    "Frente",
    "Canal",
    "Plataforma",
    "Tipo de Plano",
    "Plano",
    "Característica da massa",
    "Entrypoint",
    "Funcionalidade",
    "Cenário",
    "Resultado esperado",
    C_COL_STATUS,
    "N° INC",
];

/// Light green.
pub const C_ARGB_PASSED: &str = "FFC6EFCE";
/// Light yellow.
pub const C_ARGB_NOT_EXECUTED: &str = "FFFFEB9C";
/// Light red.
pub const C_ARGB_FAILED: &str = "FFFFC7CE";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Occurrences

/// `(base sheet, extraction sheet candidates)` for the functional incidents tab.
pub const TUP_OCCURRENCES_FUNCTIONAL: (&str, [&str; 1]) = ("Funcionais", ["extração funcionais"]);
/// `(base sheet, extraction sheet candidates)` for the critical incidents tab.
pub const TUP_OCCURRENCES_CRITICAL: (&str, [&str; 2]) =
    ("Criticos NOW", ["extração criticos", "extração críticos"]);

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ChgDigest

/// CHG workbook sheets concatenated in order.
pub const TUP_SHEETS_CHG: [&str; 2] = ["CHGs", "CHGs II"];

/// CHG change number.
pub const C_COL_CHG_NUMBER: &str = "Número";
/// Planned start.
pub const C_COL_CHG_START: &str = "Data de início planejada";
/// Planned end.
pub const C_COL_CHG_END: &str = "Data de término planejada";
/// Broadcast flag (`Sim` selects the CHG).
pub const C_COL_CHG_SEND: &str = "Enviar Keep";

/// Columns required in every CHG sheet.
pub const TUP_COLUMNS_CHG: [&str; 10] = [
    C_COL_CHG_NUMBER,
    "Descrição resumida",
    "Status",
    "Tipo de Indisponibilidade",
    C_COL_CHG_START,
    C_COL_CHG_END,
    "IC Impactado",
    "Grupo de atribuição",
    "Observação (Time Mudanças)",
    C_COL_CHG_SEND,
];

/// Sentence rendered when no CHG falls in the window.
pub const C_MSG_NO_CHG: &str = "Nenhuma CHG encontrada para o dia de hoje com os filtros aplicados.";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Incidents

/// Fixed owner printed for every incident list.
pub const C_INCIDENT_OWNER: &str = "QD Sustentação";
/// Maximum functionality text length in the incident report.
pub const N_LEN_INCIDENT_TEXT_MAX: usize = 70;
/// Placeholder when no functionality text can be derived.
pub const C_INCIDENT_UNSPECIFIED: &str = "Não especificado";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Factories

/// Default status normalization rules.
pub fn derive_default_status_rules() -> SpecStatusRules {
    SpecStatusRules {
        excluded_terms: TUP_STATUS_EXCLUDED.iter().map(|c| c.to_string()).collect(),
    }
}

/// Default column alias/ignore rules.
pub fn derive_default_column_rules() -> SpecColumnRules {
    SpecColumnRules {
        aliases: TUP_COLUMN_ALIASES
            .iter()
            .map(|(c_from, c_to)| (c_from.to_string(), c_to.to_string()))
            .collect::<BTreeMap<_, _>>(),
        ignored: TUP_COLUMNS_IGNORED.iter().map(|c| c.to_string()).collect(),
    }
}

/// Default status fill colors.
pub fn derive_default_status_colors() -> SpecStatusColors {
    SpecStatusColors {
        passed: Some(C_ARGB_PASSED.to_string()),
        not_executed: Some(C_ARGB_NOT_EXECUTED.to_string()),
        failed: Some(C_ARGB_FAILED.to_string()),
    }
}

/// Default test-merge configuration.
pub fn derive_default_merge_config() -> SpecMergeConfig {
    SpecMergeConfig::default()
}

/// Default occurrences-refresh configuration.
pub fn derive_default_occurrences_config() -> SpecOccurrencesConfig {
    SpecOccurrencesConfig::default()
}

/// Default CHG digest configuration.
pub fn derive_default_chg_report_config() -> SpecChgReportConfig {
    SpecChgReportConfig::default()
}

/// Default incident report configuration.
pub fn derive_default_incident_config() -> SpecIncidentConfig {
    SpecIncidentConfig::default()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
