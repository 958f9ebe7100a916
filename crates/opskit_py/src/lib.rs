use std::collections::BTreeMap;

use opskit_report::util::{parse_date_ddmmyyyy, resolve_reference_date};
use opskit_report::{
    ReportError, SpecMergeReport, SpecToolkitConfig, compare_chgs as rs_compare_chgs,
    derive_incident_statistics, generate_chg_report as rs_generate_chg_report,
    generate_incident_report as rs_generate_incident_report, parse_incident_document,
    process_tests as rs_process_tests, update_occurrences as rs_update_occurrences,
    write_comparison_workbook,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "opskit.report.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "MergeReport")]
#[derive(Debug, Clone)]
struct PyMergeReport {
    #[pyo3(get)]
    date: String,
    #[pyo3(get)]
    cnt_rows_appended: usize,
    #[pyo3(get)]
    cnt_rows_excluded: usize,
    #[pyo3(get)]
    cnt_rows_unrecognized: usize,
    #[pyo3(get)]
    statuses_seen: Vec<String>,
    #[pyo3(get)]
    row_first: Option<u32>,
    #[pyo3(get)]
    row_last: Option<u32>,
    #[pyo3(get)]
    sheets_used: Vec<String>,
    #[pyo3(get)]
    warnings: Vec<String>,
}

impl PyMergeReport {
    fn from_report(report: SpecMergeReport, cnt_rows_appended: usize) -> Self {
        Self {
            date: report.date,
            cnt_rows_appended,
            cnt_rows_excluded: report.n_rows_excluded,
            cnt_rows_unrecognized: report.n_rows_unrecognized,
            statuses_seen: report.statuses_seen,
            row_first: report.append.row_first,
            row_last: report.append.row_last,
            sheets_used: report
                .sheets
                .into_iter()
                .filter_map(|stat| stat.sheet_used)
                .collect(),
            warnings: report.warnings,
        }
    }
}

#[pymethods]
impl PyMergeReport {
    #[getter]
    fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    fn to_dict(&self) -> BTreeMap<String, usize> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("appended".to_string(), self.cnt_rows_appended);
        dict_counts.insert("excluded".to_string(), self.cnt_rows_excluded);
        dict_counts.insert("unrecognized".to_string(), self.cnt_rows_unrecognized);
        dict_counts
    }
}

fn map_report_error(exception: ReportError) -> PyErr {
    if exception.is_input_error() {
        PyValueError::new_err(exception.to_string())
    } else {
        PyRuntimeError::new_err(exception.to_string())
    }
}

fn parse_config(config_json: Option<&str>) -> PyResult<SpecToolkitConfig> {
    match config_json {
        Some(c_json) if !c_json.trim().is_empty() => serde_json::from_str(c_json)
            .map_err(|err| PyValueError::new_err(format!("Invalid config JSON: {err}"))),
        _ => Ok(SpecToolkitConfig::default()),
    }
}

#[pyfunction(name = "process_tests")]
#[pyo3(signature = (notebook, daily, date = None, config_json = None))]
fn process_tests_py<'py>(
    py: Python<'py>,
    notebook: &[u8],
    daily: &[u8],
    date: Option<&str>,
    config_json: Option<&str>,
) -> PyResult<(Bound<'py, PyBytes>, usize)> {
    let (bytes, report) = process_tests_impl(py, notebook, daily, date, config_json)?;
    Ok((bytes, report.cnt_rows_appended))
}

#[pyfunction(name = "process_tests_detailed")]
#[pyo3(signature = (notebook, daily, date = None, config_json = None))]
fn process_tests_detailed_py<'py>(
    py: Python<'py>,
    notebook: &[u8],
    daily: &[u8],
    date: Option<&str>,
    config_json: Option<&str>,
) -> PyResult<(Bound<'py, PyBytes>, PyMergeReport)> {
    process_tests_impl(py, notebook, daily, date, config_json)
}

fn process_tests_impl<'py>(
    py: Python<'py>,
    notebook: &[u8],
    daily: &[u8],
    date: Option<&str>,
    config_json: Option<&str>,
) -> PyResult<(Bound<'py, PyBytes>, PyMergeReport)> {
    let cfg = parse_config(config_json)?;
    let output = py
        .allow_threads(|| rs_process_tests(notebook, daily, date, &cfg.merge))
        .map_err(map_report_error)?;
    let report = PyMergeReport::from_report(output.report, output.n_rows_appended);
    Ok((PyBytes::new(py, &output.bytes), report))
}

#[pyfunction(name = "update_occurrences")]
#[pyo3(signature = (base, functional, critical, config_json = None))]
fn update_occurrences_py<'py>(
    py: Python<'py>,
    base: &[u8],
    functional: &[u8],
    critical: &[u8],
    config_json: Option<&str>,
) -> PyResult<(Bound<'py, PyBytes>, usize)> {
    let cfg = parse_config(config_json)?;
    let output = py
        .allow_threads(|| rs_update_occurrences(base, functional, critical, &cfg.occurrences))
        .map_err(map_report_error)?;
    Ok((PyBytes::new(py, &output.bytes), output.n_records))
}

#[pyfunction(name = "generate_chg_report")]
#[pyo3(signature = (workbook, reference_date = None, config_json = None))]
fn generate_chg_report_py(
    py: Python<'_>,
    workbook: &[u8],
    reference_date: Option<&str>,
    config_json: Option<&str>,
) -> PyResult<String> {
    let cfg = parse_config(config_json)?;
    let reference_date = resolve_reference_date(reference_date).map_err(map_report_error)?;
    let report = py
        .allow_threads(|| rs_generate_chg_report(workbook, reference_date, &cfg.chg))
        .map_err(map_report_error)?;
    Ok(report.text)
}

#[pyfunction(name = "generate_incident_report")]
#[pyo3(signature = (json_text, date = None, config_json = None))]
fn generate_incident_report_py(
    json_text: &str,
    date: Option<&str>,
    config_json: Option<&str>,
) -> PyResult<String> {
    let cfg = parse_config(config_json)?;
    let date = resolve_reference_date(date).map_err(map_report_error)?;
    rs_generate_incident_report(json_text, date, &cfg.incident).map_err(map_report_error)
}

#[pyfunction(name = "incident_statistics")]
fn incident_statistics_py(json_text: &str) -> PyResult<BTreeMap<String, usize>> {
    let doc = parse_incident_document(json_text).map_err(map_report_error)?;
    let stats = derive_incident_statistics(&doc.records);
    let mut dict_counts = BTreeMap::new();
    dict_counts.insert("criticos".to_string(), stats.critical);
    dict_counts.insert("altos".to_string(), stats.high);
    dict_counts.insert("especificos".to_string(), stats.specific);
    dict_counts.insert("vips".to_string(), stats.vip);
    dict_counts.insert("total".to_string(), stats.total);
    Ok(dict_counts)
}

#[pyfunction(name = "compare_chgs")]
fn compare_chgs_py<'py>(
    py: Python<'py>,
    principal: &[u8],
    email: &[u8],
) -> PyResult<(Bound<'py, PyBytes>, usize, usize, usize)> {
    let (bytes, (n_new, n_missing, n_common)) = py
        .allow_threads(|| {
            let cmp = rs_compare_chgs(principal, email)?;
            let (bytes, _) = write_comparison_workbook(&cmp)?;
            Ok::<_, ReportError>((bytes, cmp.counts()))
        })
        .map_err(map_report_error)?;
    Ok((PyBytes::new(py, &bytes), n_new, n_missing, n_common))
}

#[pyfunction(name = "validate_date")]
fn validate_date_py(date: &str) -> PyResult<String> {
    parse_date_ddmmyyyy(date)
        .map(|value| value.format("%d/%m/%Y").to_string())
        .map_err(map_report_error)
}

#[pymodule]
fn _opskit_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyMergeReport>()?;
    module.add_function(wrap_pyfunction!(process_tests_py, module)?)?;
    module.add_function(wrap_pyfunction!(process_tests_detailed_py, module)?)?;
    module.add_function(wrap_pyfunction!(update_occurrences_py, module)?)?;
    module.add_function(wrap_pyfunction!(generate_chg_report_py, module)?)?;
    module.add_function(wrap_pyfunction!(generate_incident_report_py, module)?)?;
    module.add_function(wrap_pyfunction!(incident_statistics_py, module)?)?;
    module.add_function(wrap_pyfunction!(compare_chgs_py, module)?)?;
    module.add_function(wrap_pyfunction!(validate_date_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
