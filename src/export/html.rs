use crate::export::{COLUMNS, ReportRow};

pub const CONTENT_TYPE: &str = "text/html; charset=utf-8";

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; margin: 20px; }
    h1 { text-align: center; margin-bottom: 20px; }
    table { width: 100%; border-collapse: collapse; margin-bottom: 20px; }
    th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
    th { background-color: #f2f2f2; font-weight: bold; }
    .present { background-color: #e8f5e9; color: #2e7d32; }
    .absent { background-color: #ffebee; color: #c62828; }
    @media print {
      body { -webkit-print-color-adjust: exact; print-color-adjust: exact; }
    }
"#;

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Printable "Reporte de Asistencia" document; the browser prints it.
pub fn to_printable_html(rows: &[ReportRow]) -> String {
    let header: String = COLUMNS
        .iter()
        .map(|c| format!("<th>{}</th>", escape(c)))
        .collect();

    let body: String = rows
        .iter()
        .map(|row| {
            let cells = row.cells();
            let [rest @ .., last] = &cells;
            let class = if row.presente { "present" } else { "absent" };
            let tds: String = rest
                .iter()
                .map(|c| format!("<td>{}</td>", escape(c)))
                .collect();
            format!(
                "      <tr>{}<td class=\"{}\">{}</td></tr>\n",
                tds,
                class,
                escape(last)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Reporte de Asistencia</title>
  <meta charset="UTF-8">
  <style>{style}</style>
</head>
<body>
  <h1>Reporte de Asistencia</h1>
  <table>
    <thead>
      <tr>{header}</tr>
    </thead>
    <tbody>
{body}    </tbody>
  </table>
</body>
</html>
"#,
        style = STYLE,
        header = header,
        body = body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::{entry, now, seven};

    #[test]
    fn marks_presence_per_row() {
        let rows = vec![
            ReportRow::build(&entry("Luis", Some("07:15"), Some("16:00")), seven(), now()),
            ReportRow::build(&entry("Eva", None, None), seven(), now()),
        ];
        let html = to_printable_html(&rows);

        assert!(html.contains("<th>Atraso (min)</th>"));
        assert!(html.contains("<td>Luis</td>"));
        assert!(html.contains("<td>15</td>"));
        assert!(html.contains(r#"<td class="present">Presente</td>"#));
        assert!(html.contains(r#"<td class="absent">Falto</td>"#));
    }

    #[test]
    fn escapes_user_text() {
        let rows = vec![ReportRow::build(
            &entry("<script>alert('x')</script>", Some("07:00"), None),
            seven(),
            now(),
        )];
        let html = to_printable_html(&rows);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn empty_report_has_headers_only() {
        let html = to_printable_html(&[]);
        assert!(html.contains("<th>Fecha</th>"));
        assert!(!html.contains("<td>"));
    }
}
