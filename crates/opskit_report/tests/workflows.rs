use chrono::NaiveDate;
use opskit_io_xlsx::{
    get_sheet, list_sheet_names, read_cell_fill_argb, read_row_values, read_workbook_bytes,
    write_workbook_bytes,
};
use opskit_report::{
    ReportError, SpecChgReportConfig, SpecMergeConfig, SpecOccurrencesConfig, compare_chgs,
    generate_chg_report, process_tests, update_occurrences, write_comparison_workbook,
};
use umya_spreadsheet::Spreadsheet;

const C_ARGB_TEMPLATE: &str = "FFDDEBF7";

fn create_book(sheets: &[(&str, Vec<Vec<&str>>)]) -> Spreadsheet {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    for (c_sheet, rows) in sheets {
        let ws = book.new_sheet(*c_sheet).expect("new sheet");
        for (n_row, row) in (1u32..).zip(rows.iter()) {
            for (n_col, c_value) in (1u32..).zip(row.iter()) {
                if !c_value.is_empty() {
                    ws.get_cell_mut((n_col, n_row)).set_value(*c_value);
                }
            }
        }
    }
    book
}

fn to_bytes(book: &Spreadsheet) -> Vec<u8> {
    write_workbook_bytes(book).expect("workbook bytes")
}

fn create_notebook() -> Vec<u8> {
    to_bytes(&create_book(&[
        (
            "Caderno App Vivo",
            vec![
                vec!["ID Fluxo", "Cenário", "Status do Teste QD", "Notas QD"],
                vec!["1", "Login", " passed ", "ok"],
                vec!["2", "Compra", "FAILED", "erro no pagamento"],
                vec!["3", "Busca", "a validar", ""],
                vec!["4", "Perfil", "bloqueado", ""],
            ],
        ),
        (
            "Caderno Web B2C",
            vec![
                vec!["Cenário", "Status de Teste", "N° INC"],
                vec!["Checkout", "not executed", "INC0042"],
            ],
        ),
    ]))
}

/// `B2C` sheet with five formatted data rows under the header.
fn create_daily() -> Vec<u8> {
    let header = vec!["Data", "Cenário", "Status", "N° INC", "Observação"];
    let mut rows = vec![header];
    for _ in 0..5 {
        rows.push(vec!["10/05/2024", "antigo", "Passed", "", "sem notas"]);
    }
    let mut book = create_book(&[("Resumo", vec![vec!["Total"]]), ("B2C", rows)]);
    let ws = book.get_sheet_by_name_mut("B2C").expect("B2C");
    for n_row in 2..=6u32 {
        for n_col in 1..=5u32 {
            ws.get_style_mut((n_col, n_row))
                .set_background_color(C_ARGB_TEMPLATE);
        }
    }
    to_bytes(&book)
}

#[test]
fn test_process_tests_appends_after_existing_rows() {
    let v_daily = create_daily();
    let merged = process_tests(
        &create_notebook(),
        &v_daily,
        Some("15/05/2024"),
        &SpecMergeConfig::default(),
    )
    .expect("merge");

    assert_eq!(merged.n_rows_appended, 3);
    assert_eq!(merged.report.n_rows_excluded, 1);
    assert_eq!(merged.report.n_rows_unrecognized, 1);
    assert_eq!(merged.report.append.row_first, Some(7));
    assert_eq!(merged.report.append.row_last, Some(9));

    let book_before = read_workbook_bytes(&v_daily).expect("read before");
    let book_after = read_workbook_bytes(&merged.bytes).expect("read after");
    let ws_before = get_sheet(&book_before, "B2C").expect("B2C before");
    let ws = get_sheet(&book_after, "B2C").expect("B2C after");

    for n_row in 1..=6u32 {
        assert_eq!(
            read_row_values(ws, n_row, 5),
            read_row_values(ws_before, n_row, 5),
            "row {n_row} must be untouched"
        );
    }
    assert_eq!(
        read_row_values(ws, 7, 5),
        vec!["15/05/2024", "Login", "Passed", "", "ok"]
    );
    assert_eq!(
        read_row_values(ws, 8, 5),
        vec!["15/05/2024", "Compra", "Failed", "", "erro no pagamento"]
    );
    assert_eq!(
        read_row_values(ws, 9, 5),
        vec!["15/05/2024", "Checkout", "Not Executed", "INC0042", ""]
    );
}

#[test]
fn test_process_tests_overwrites_stray_cells_in_appended_rows() {
    let mut book_daily = read_workbook_bytes(&create_daily()).expect("read daily");
    let ws = book_daily.get_sheet_by_name_mut("B2C").expect("B2C");
    ws.get_cell_mut((4, 7)).set_value("INC-STALE");
    ws.get_cell_mut((5, 7)).set_value("nota antiga");
    let v_notebook = to_bytes(&create_book(&[(
        "Caderno App Vivo",
        vec![vec!["Cenário", "Status"], vec!["Login", "failed"]],
    )]));

    let merged = process_tests(
        &v_notebook,
        &to_bytes(&book_daily),
        Some("15/05/2024"),
        &SpecMergeConfig::default(),
    )
    .expect("merge");

    assert_eq!(merged.report.append.row_first, Some(7));
    let book = read_workbook_bytes(&merged.bytes).expect("read");
    let ws = get_sheet(&book, "B2C").expect("B2C");
    assert_eq!(
        read_row_values(ws, 7, 5),
        vec!["15/05/2024", "Login", "Failed", "", ""]
    );
}

#[test]
fn test_process_tests_fills_status_and_propagates_formats() {
    let merged = process_tests(
        &create_notebook(),
        &create_daily(),
        Some("15/05/2024"),
        &SpecMergeConfig::default(),
    )
    .expect("merge");
    let book = read_workbook_bytes(&merged.bytes).expect("read");
    let ws = get_sheet(&book, "B2C").expect("B2C");

    assert_eq!(read_cell_fill_argb(ws, (3, 7)).as_deref(), Some("FFC6EFCE"));
    assert_eq!(read_cell_fill_argb(ws, (3, 8)).as_deref(), Some("FFFFC7CE"));
    assert_eq!(read_cell_fill_argb(ws, (3, 9)).as_deref(), Some("FFFFEB9C"));
    for n_row in 7..=9u32 {
        assert_eq!(
            read_cell_fill_argb(ws, (2, n_row)).as_deref(),
            Some(C_ARGB_TEMPLATE),
            "row {n_row} inherits the template fill"
        );
    }
    assert_eq!(read_cell_fill_argb(ws, (3, 6)).as_deref(), Some(C_ARGB_TEMPLATE));
    assert_eq!(ws.get_value((1, 2)), "10/05/2024");
}

#[test]
fn test_process_tests_rejects_only_excluded_statuses() {
    let v_notebook = to_bytes(&create_book(&[(
        "Caderno App Vivo",
        vec![
            vec!["Cenário", "Status"],
            vec!["Login", "A Validar"],
            vec!["Busca", "a validar"],
        ],
    )]));
    let err = process_tests(
        &v_notebook,
        &create_daily(),
        Some("15/05/2024"),
        &SpecMergeConfig::default(),
    )
    .expect_err("must fail");

    assert!(matches!(err, ReportError::NoValidRows { .. }));
    let c_msg = err.to_string();
    assert!(c_msg.contains("Passed, Not Executed, Failed"), "{c_msg}");
    assert!(c_msg.contains("A Validar"), "{c_msg}");
}

#[test]
fn test_process_tests_requires_status_column() {
    let v_notebook = to_bytes(&create_book(&[(
        "Caderno App Vivo",
        vec![vec!["Cenário", "Resultado"], vec!["Login", "Passed"]],
    )]));
    let err = process_tests(
        &v_notebook,
        &create_daily(),
        Some("15/05/2024"),
        &SpecMergeConfig::default(),
    )
    .expect_err("must fail");
    assert!(matches!(err, ReportError::MissingStatusColumn { .. }));
}

#[test]
fn test_process_tests_requires_destination_sheet() {
    let v_daily = to_bytes(&create_book(&[("B2B", vec![vec!["Data", "Status"]])]));
    let err = process_tests(
        &create_notebook(),
        &v_daily,
        Some("15/05/2024"),
        &SpecMergeConfig::default(),
    )
    .expect_err("must fail");

    let ReportError::MissingDestinationSheet { sheet, available } = err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(sheet, "B2C");
    assert_eq!(available, "B2B");
}

#[test]
fn test_process_tests_falls_back_to_first_sheet() {
    let v_notebook = to_bytes(&create_book(&[(
        "Planilha1",
        vec![vec!["Cenário", "Status"], vec!["Login", "Passed"]],
    )]));
    let merged = process_tests(
        &v_notebook,
        &create_daily(),
        Some("15/05/2024"),
        &SpecMergeConfig::default(),
    )
    .expect("merge");

    assert_eq!(merged.n_rows_appended, 1);
    assert_eq!(
        merged.report.sheets[0].sheet_used.as_deref(),
        Some("Planilha1")
    );
    assert!(merged.report.sheets[1].reason_skipped.is_some());
}

#[test]
fn test_update_occurrences_replaces_data_rows() {
    let mut book_base = create_book(&[
        (
            "Funcionais",
            vec![
                vec!["Número", "Estado"],
                vec!["INC-OLD-1", "Fechado"],
                vec!["INC-OLD-2", "Fechado"],
            ],
        ),
        (
            "Criticos NOW",
            vec![vec!["Número", "Estado"], vec!["INC-OLD-3", "Aberto"]],
        ),
    ]);
    let ws = book_base.get_sheet_by_name_mut("Funcionais").expect("Funcionais");
    ws.get_style_mut((1, 3)).set_background_color(C_ARGB_TEMPLATE);

    let v_functional = to_bytes(&create_book(&[(
        "extração funcionais",
        vec![
            vec!["Número", "Estado"],
            vec!["INC-1", "Novo"],
            vec!["INC-2", "Novo"],
            vec!["INC-3", "Em andamento"],
        ],
    )]));
    let v_critical = to_bytes(&create_book(&[(
        "extração críticos",
        vec![vec!["Número", "Estado"], vec!["INC-9", "Novo"]],
    )]));

    let refreshed = update_occurrences(
        &to_bytes(&book_base),
        &v_functional,
        &v_critical,
        &SpecOccurrencesConfig::default(),
    )
    .expect("refresh");
    assert_eq!(refreshed.n_records, 4);
    assert_eq!(refreshed.critical.sheet_extraction, "extração críticos");

    let book = read_workbook_bytes(&refreshed.bytes).expect("read");
    let ws = get_sheet(&book, "Funcionais").expect("Funcionais");
    assert_eq!(read_row_values(ws, 2, 2), vec!["INC-1", "Novo"]);
    assert_eq!(read_row_values(ws, 4, 2), vec!["INC-3", "Em andamento"]);
    assert_eq!(read_cell_fill_argb(ws, (1, 4)).as_deref(), Some(C_ARGB_TEMPLATE));
    let ws = get_sheet(&book, "Criticos NOW").expect("Criticos NOW");
    assert_eq!(read_row_values(ws, 2, 2), vec!["INC-9", "Novo"]);
}

#[test]
fn test_update_occurrences_requires_extraction_sheet() {
    let v_base = to_bytes(&create_book(&[
        ("Funcionais", vec![vec!["Número"]]),
        ("Criticos NOW", vec![vec!["Número"]]),
    ]));
    let v_other = to_bytes(&create_book(&[("Planilha1", vec![vec!["Número"]])]));
    let err = update_occurrences(&v_base, &v_other, &v_other, &SpecOccurrencesConfig::default())
        .expect_err("must fail");
    assert!(matches!(err, ReportError::MissingSheet { .. }));
}

#[test]
fn test_generate_chg_report_selects_overnight_window() {
    let header = vec![
        "Número",
        "Descrição resumida",
        "Status",
        "Tipo de Indisponibilidade",
        "Data de início planejada",
        "Data de término planejada",
        "IC Impactado",
        "Grupo de atribuição",
        "Observação (Time Mudanças)",
        "Enviar Keep",
    ];
    let v_chg = to_bytes(&create_book(&[(
        "CHGs",
        vec![
            header,
            vec![
                "CHG1001", "Janela de banco", "Agendada", "Indisponibilidade Total",
                "20/05/2024 18:00", "20/05/2024 23:00", "DB01", "DBA", "", "Sim",
            ],
            vec![
                "CHG1002", "Deploy app", "Agendada", "Sem indisponibilidade",
                "21/05/2024 02:30", "21/05/2024 03:30", "APP01", "Dev", "", "sim",
            ],
            vec![
                "CHG1003", "Manutenção diurna", "Agendada", "Sem indisponibilidade",
                "21/05/2024 10:00", "21/05/2024 11:00", "APP02", "Dev", "", "Sim",
            ],
            vec![
                "CHG1004", "Sem envio", "Agendada", "Sem indisponibilidade",
                "20/05/2024 19:00", "20/05/2024 20:00", "APP03", "Dev", "", "Não",
            ],
            vec![
                "CHG1005", "Data ruim", "Agendada", "Sem indisponibilidade",
                "amanhã", "depois", "APP04", "Dev", "", "Sim",
            ],
        ],
    )]));

    let report = generate_chg_report(
        &v_chg,
        NaiveDate::from_ymd_opt(2024, 5, 20),
        &SpecChgReportConfig::default(),
    )
    .expect("report");

    assert_eq!(report.n_rows_read, 5);
    assert_eq!(report.n_rows_bad_date, 1);
    assert_eq!(report.n_selected, 2);
    assert!(report.text.contains("*Mudança:* CHG1001"));
    assert!(report.text.contains("📵 Indisponibilidade Total"));
    assert!(report.text.contains("👍 Sem indisponibilidade"));
    assert!(!report.text.contains("CHG1003"));
    assert!(!report.text.contains("CHG1004"));
    assert!(report.warnings.iter().any(|c| c.contains("CHGs II")));
}

#[test]
fn test_compare_chgs_writes_three_sheets() {
    let v_principal = to_bytes(&create_book(&[(
        "Principal",
        vec![
            vec!["Número", "Descrição"],
            vec!["CHG0001", "Banco"],
            vec!["CHG0002", "Rede"],
        ],
    )]));
    let v_email = to_bytes(&create_book(&[(
        "Tabela 1",
        vec![
            vec!["Número da mudança", "Resumo"],
            vec!["CHG0002", "Rede"],
            vec!["CHG0003", "Firewall"],
        ],
    )]));

    let cmp = compare_chgs(&v_principal, &v_email).expect("compare");
    assert_eq!(cmp.counts(), (1, 1, 1));
    assert_eq!(cmp.new.value(0, 0), "0003");
    assert_eq!(cmp.missing.value(0, 0), "0001");

    let (bytes, _) = write_comparison_workbook(&cmp).expect("write");
    let book = read_workbook_bytes(&bytes).expect("read");
    assert_eq!(
        list_sheet_names(&book),
        vec!["CHGs novas", "CHGs faltantes", "CHGs comuns"]
    );
}

#[test]
fn test_update_occurrences_keeps_blank_separator_rows() {
    let v_base = to_bytes(&create_book(&[
        ("Funcionais", vec![vec!["Número", "Estado"]]),
        ("Criticos NOW", vec![vec!["Número", "Estado"]]),
    ]));
    let v_functional = to_bytes(&create_book(&[(
        "extração funcionais",
        vec![
            vec!["Número", "Estado"],
            vec!["INC-1", "Novo"],
            vec!["", ""],
            vec!["INC-2", "Novo"],
        ],
    )]));
    let v_critical = to_bytes(&create_book(&[(
        "extração criticos",
        vec![vec!["Número", "Estado"], vec!["INC-9", "Novo"]],
    )]));

    let refreshed = update_occurrences(
        &v_base,
        &v_functional,
        &v_critical,
        &SpecOccurrencesConfig::default(),
    )
    .expect("refresh");
    assert_eq!(refreshed.functional.n_records, 3);
    assert_eq!(refreshed.n_records, 4);

    let book = read_workbook_bytes(&refreshed.bytes).expect("read");
    let ws = get_sheet(&book, "Funcionais").expect("Funcionais");
    assert_eq!(read_row_values(ws, 3, 2), vec!["", ""]);
    assert_eq!(read_row_values(ws, 4, 2), vec!["INC-2", "Novo"]);
}
