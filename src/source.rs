//! Report loading.
//!
//! Reads the first worksheet of a spreadsheet (via calamine) or a CSV file
//! into `Record`s. The header row is validated once, here; later stages can
//! rely on every record carrying all ten fields.

use std::collections::HashMap;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::pipeline::types::Record;

/// Source column headers, in `Record` field order.
pub const COLUMNS: [&str; 10] = [
    "Instrumento",
    "Número Ajustes",
    "Situação P.Trabalho",
    "Situação TA",
    "Número TA",
    "Aba Anexos",
    "Data Esclarecimento",
    "Resposta Esclarecimento",
    "Técnico",
    "e-mail do Técnico",
];

/// Textual format of the clarification date column.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Load every record from the report at `path`.
pub fn load_table(path: &Path) -> Result<Vec<Record>, LoadError> {
    info!("Loading report from {}", path.display());

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let (header, rows) = if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        read_spreadsheet(path)?
    } else if extension == "csv" {
        read_csv(path)?
    } else {
        return Err(LoadError::UnsupportedFormat(path.display().to_string()));
    };

    let records = records_from_rows(&header, rows)?;
    info!("Loaded {} record(s)", records.len());
    Ok(records)
}

/// Map raw rows onto records using the header row.
///
/// Headers are matched after trimming and in any order. Every missing
/// column is reported at once. Extra columns are ignored and short rows
/// read as empty cells.
pub fn records_from_rows<I>(header: &[String], rows: I) -> Result<Vec<Record>, LoadError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (idx, name) in header.iter().enumerate() {
        let name = name.trim_start_matches('\u{feff}').trim();
        positions.entry(name).or_insert(idx);
    }

    let missing: Vec<String> = COLUMNS
        .iter()
        .filter(|c| !positions.contains_key(*c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    let index: Vec<usize> = COLUMNS.iter().map(|c| positions[c]).collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            let cell = |column: usize| row.get(index[column]).cloned().unwrap_or_default();
            Record {
                instrument_id: cell(0),
                adjustment_count: cell(1),
                work_situation: cell(2),
                ta_situation: cell(3),
                ta_number: cell(4),
                attachment_tab: cell(5),
                clarification_date: parse_date(&cell(6)),
                clarification_response: cell(7),
                responsible_party: cell(8),
                responsible_email: cell(9),
            }
        })
        .collect())
}

/// Parse a `dd/mm/YYYY` date. Anything else is `None`, never an error.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

// ── Spreadsheet ─────────────────────────────────────────────────────

type RawTable = (Vec<String>, Vec<Vec<String>>);

fn read_spreadsheet(path: &Path) -> Result<RawTable, LoadError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| LoadError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::EmptySource)?
        .map_err(|e| LoadError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or(LoadError::EmptySource)?
        .iter()
        .map(cell_text)
        .collect();

    let body: Vec<Vec<String>> = rows.map(|row| row.iter().map(cell_text).collect()).collect();
    debug!(rows = body.len(), "Read worksheet");

    Ok((header, body))
}

/// Normalize a spreadsheet cell to the text the rules see.
///
/// Blank and error cells become `""`, whole numbers lose their `.0`, and
/// date cells are written as `dd/mm/YYYY`.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| s.clone()),
        Data::DurationIso(s) => s.clone(),
    }
}

// ── CSV ─────────────────────────────────────────────────────────────

fn read_csv(path: &Path) -> Result<RawTable, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    let delimiter = sniff_delimiter(&contents);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    if header.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::EmptySource);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(String::from).collect());
    }
    debug!(rows = rows.len(), delimiter = %(delimiter as char), "Read CSV");

    Ok((header, rows))
}

/// Pick `;` when the header line uses it more than `,`.
fn sniff_delimiter(contents: &str) -> u8 {
    let first_line = contents.lines().next().unwrap_or_default();
    if first_line.matches(';').count() > first_line.matches(',').count() {
        b';'
    } else {
        b','
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use std::io::Write;

    fn header() -> Vec<String> {
        COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn maps_columns_in_order() {
        let records = records_from_rows(
            &header(),
            vec![row(&[
                "900100",
                "2",
                "Em Análise (aguardando parecer)",
                "Cadastrada",
                "3",
                "Anexos",
                "15/03/2024",
                "sim",
                "Ana",
                "ana@example.com",
            ])],
        )
        .unwrap();

        let record = &records[0];
        assert_eq!(record.instrument_id, "900100");
        assert_eq!(record.adjustment_count, "2");
        assert_eq!(record.ta_situation, "Cadastrada");
        assert_eq!(record.ta_number, "3");
        assert_eq!(record.attachment_tab, "Anexos");
        assert_eq!(record.clarification_date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(record.clarification_response, "sim");
        assert_eq!(record.responsible_party, "Ana");
        assert_eq!(record.responsible_email, "ana@example.com");
    }

    #[test]
    fn headers_are_trimmed_and_order_insensitive() {
        let mut shuffled: Vec<String> = header()
            .into_iter()
            .rev()
            .map(|h| format!(" {h} "))
            .collect();
        shuffled.push("Extra".into());

        let mut cells: Vec<String> = vec![String::new(); 11];
        cells[9] = "900100".into(); // Instrumento reversed to position 9
        cells[0] = "ana@example.com".into();

        let records = records_from_rows(&shuffled, vec![cells]).unwrap();
        assert_eq!(records[0].instrument_id, "900100");
        assert_eq!(records[0].responsible_email, "ana@example.com");
    }

    #[test]
    fn missing_columns_are_all_named() {
        let partial: Vec<String> = header()
            .into_iter()
            .filter(|h| h != "Técnico" && h != "Situação TA")
            .collect();

        match records_from_rows(&partial, Vec::new()) {
            Err(LoadError::MissingColumns(missing)) => {
                assert_eq!(missing, vec!["Situação TA".to_string(), "Técnico".to_string()]);
            }
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn short_rows_read_as_empty() {
        let records = records_from_rows(&header(), vec![row(&["900100"])]).unwrap();
        assert_eq!(records[0].instrument_id, "900100");
        assert_eq!(records[0].responsible_email, "");
        assert_eq!(records[0].clarification_date, None);
    }

    #[test]
    fn unparsable_dates_are_absent() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2024-03-15"), None);
        assert_eq!(parse_date("31/02/2024"), None);
        assert_eq!(parse_date(" 01/12/2023 "), NaiveDate::from_ymd_opt(2023, 12, 1));
    }

    #[test]
    fn cell_text_normalizes_values() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Float(900100.0)), "900100");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::String("SIM".into())), "SIM");
        assert_eq!(
            cell_text(&Data::DateTimeIso("2024-03-15T00:00:00".into())),
            "15/03/2024"
        );
    }

    #[test]
    fn cell_text_formats_serial_dates() {
        let cell = Data::DateTime(ExcelDateTime::new(
            45366.0,
            ExcelDateTimeType::DateTime,
            false,
        ));
        assert_eq!(cell_text(&cell), "15/03/2024");
    }

    #[test]
    fn loads_xlsx_workbook() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, format!("  {name} ")).unwrap();
        }
        let date_format = rust_xlsxwriter::Format::new().set_num_format("dd/mm/yyyy");
        let date = rust_xlsxwriter::ExcelDateTime::from_ymd(2024, 3, 15).unwrap();
        sheet.write_number(1, 0, 900100.0).unwrap();
        sheet.write_string(1, 3, "Concluída").unwrap();
        sheet.write_datetime_with_format(1, 6, &date, &date_format).unwrap();
        sheet.write_string(1, 7, "SIM").unwrap();
        sheet.write_string(1, 8, "Ana").unwrap();
        sheet.write_string(1, 9, "ana@example.com").unwrap();
        workbook.save(file.path()).unwrap();

        let records = load_table(file.path()).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.instrument_id, "900100");
        assert_eq!(record.adjustment_count, "");
        assert_eq!(record.ta_situation, "Concluída");
        assert_eq!(record.clarification_date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(record.clarification_response, "SIM");
        assert_eq!(record.responsible_email, "ana@example.com");
    }

    #[test]
    fn sniffs_semicolon_delimiter() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3"), b';');
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn loads_csv_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "{}", COLUMNS.join(";")).unwrap();
        writeln!(file, "900100;1;;Em Análise;;;;;Ana;ana@example.com").unwrap();
        file.flush().unwrap();

        let records = load_table(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ta_situation, "Em Análise");
        assert_eq!(records[0].responsible_party, "Ana");
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(matches!(
            load_table(file.path()),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn missing_file_is_load_error() {
        let result = load_table(Path::new("/nonexistent/report.csv"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}
