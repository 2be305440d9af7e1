//! HTML rendering of per-recipient reports.
//!
//! Pure string building. Identical rows always produce identical output.

use crate::pipeline::types::ReportRow;

/// Inline stylesheet for the report table.
const TABLE_STYLE: &str = "\
table { width: 100%; border-collapse: collapse; font-family: Arial, sans-serif; }
th, td { border: 1px solid #dddddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; font-weight: bold; }
tr:nth-child(even) { background-color: #f9f9f9; }";

/// Report heading shown above the table.
const REPORT_TITLE: &str = "Relatório de Pendências e Alertas";

/// Table header labels, in `ReportRow::cells` order.
pub const COLUMN_HEADERS: [&str; 6] = [
    "Técnico",
    "Instrumento",
    "Situação P.Trabalho",
    "Situação TA",
    "Resposta Esclarecimento",
    "Aba Anexos",
];

/// Subject prefix; the party name is appended.
const SUBJECT_PREFIX: &str = "Relatório de Alertas e Pendências";

const SIGNATURE: &str = "Equipe de Automação";

/// Email subject for a party's report.
pub fn subject_for(party: &str) -> String {
    format!("{SUBJECT_PREFIX} - {party}")
}

/// Escape text for inclusion in HTML content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render rows as a styled HTML table with one header row.
pub fn render_table(rows: &[ReportRow]) -> String {
    let mut html = String::new();
    html.push_str("<head><style>\n");
    html.push_str(TABLE_STYLE);
    html.push_str("\n</style></head>\n<body>\n");
    html.push_str(&format!("<h2>{}</h2>\n<table>\n<tr>", escape_html(REPORT_TITLE)));
    for header in COLUMN_HEADERS {
        html.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    html.push_str("</tr>\n");

    for row in rows {
        html.push_str("<tr>");
        for cell in row.cells() {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</table>\n</body>");
    html
}

/// Full message body: greeting, report table and signature.
pub fn render_body(party: &str, rows: &[ReportRow]) -> String {
    format!(
        "<p><strong>Prezado(a) {party},</strong></p>\
         <p>Segue abaixo o relatório de instrumentos sob sua responsabilidade que requerem atenção.</p>\
         {table}\
         <br><p>Atenciosamente,<br><strong>{SIGNATURE}</strong></p>",
        party = escape_html(party),
        table = render_table(rows),
    )
}
