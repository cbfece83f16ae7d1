//! Fixed invoice blocks.
//!
//! Each block is described once as a fragment tree. Publish output prints the
//! tree as template source; preview output evaluates it against mock data.

use serde_json::Value;

use super::tokens::escape_html;
use crate::element::{
    ElementContent, InvoiceHeader, InvoiceInfoTable, InvoiceItemsTable, InvoiceTotals,
    ItemColumn, DEFAULT_ITEMS_LOOP,
};
use crate::variables::{as_number, path_to_template_expr, stringify, walk};

#[derive(Debug, Clone, PartialEq)]
pub enum Frag {
    /// Markup copied verbatim.
    Raw(&'static str),
    /// User text, escaped in both modes.
    Text(String),
    Expr(Expr),
    If {
        cond: Cond,
        then: Vec<Frag>,
        otherwise: Option<Vec<Frag>>,
    },
    Each {
        path: String,
        body: Vec<Frag>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `{{ $a->b }}`
    Path(&'static str),
    /// A date printed as `d/m/Y`.
    Date(&'static str),
    /// `number_format(x, 2)`
    Money(&'static str),
    /// A field of the current loop item.
    ItemField(&'static str),
    /// A numeric field of the current loop item, formatted as money.
    ItemMoney(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    Truthy(&'static str),
    NotEmpty(&'static str),
}

/// Fragment tree for an invoice block, `None` for other element types.
pub fn fragments(content: &ElementContent) -> Option<Vec<Frag>> {
    let frags = match content {
        ElementContent::InvoiceHeader(header) => header_frags(header),
        ElementContent::InvoiceInfoTable(table) => info_table_frags(table),
        ElementContent::InvoiceItemsTable(table) => items_table_frags(table),
        ElementContent::InvoiceTotals(totals) => totals_frags(totals),
        ElementContent::InvoicePaymentInfo(_) => payment_info_frags(),
        _ => return None,
    };
    Some(frags)
}

fn header_frags(header: &InvoiceHeader) -> Vec<Frag> {
    let mut out = vec![
        Frag::Raw(r#"<div class="header"><div class="invoice-title">"#),
        Frag::Text(header.title.clone()),
        Frag::Raw("</div>"),
    ];
    if header.show_user_info {
        out.extend([
            Frag::Raw(r#"<div class="info"><strong>"#),
            Frag::Expr(Expr::Path("user.name")),
            Frag::Raw("</strong><br>"),
            Frag::Expr(Expr::Path("user.address")),
            Frag::Raw("</div>"),
        ]);
    }
    out.push(Frag::Raw("</div>"));
    out
}

fn info_table_frags(table: &InvoiceInfoTable) -> Vec<Frag> {
    let mut out = vec![Frag::Raw(r#"<table style="margin-bottom: 20px;"><tr>"#)];
    if table.show_client_info {
        out.extend([
            Frag::Raw(r#"<td><div class="bold" style="color: darkred;">Invoice To:</div><div class="bold">"#),
            Frag::Expr(Expr::Path("client.name")),
            Frag::Raw("</div><div>"),
            Frag::Expr(Expr::Path("client.address")),
            Frag::Raw("</div>"),
            Frag::If {
                cond: Cond::NotEmpty("client.tax"),
                then: vec![
                    Frag::Raw("<div>"),
                    Frag::Expr(Expr::Path("client.tax")),
                    Frag::Raw("</div>"),
                ],
                otherwise: None,
            },
            Frag::Raw("</td>"),
        ]);
    }
    if table.show_invoice_details {
        out.extend([
            Frag::Raw(r#"<td class="text-right"><div><strong>Invoice #:</strong> "#),
            Frag::Expr(Expr::Path("invoice.invoice_no")),
            Frag::Raw("</div><div><strong>Date:</strong> "),
            Frag::Expr(Expr::Date("invoice.invoice_date")),
            Frag::Raw("</div><div><strong>Due:</strong> "),
            Frag::Expr(Expr::Date("invoice.due_date")),
            Frag::Raw("</div></td>"),
        ]);
    }
    out.push(Frag::Raw("</tr></table>"));
    out
}

fn items_table_frags(table: &InvoiceItemsTable) -> Vec<Frag> {
    let describe = table.shows(ItemColumn::Description);
    let amount = table.shows(ItemColumn::Amount);
    let mut out = vec![Frag::Raw("<table class=\"w-full border-collapse\">\n<thead><tr>\n")];
    if describe {
        out.push(Frag::Raw("<th class=\"border p-2 bg-gray-200\">Description</th>\n"));
    }
    if amount {
        out.push(Frag::Raw("<th class=\"border p-2 bg-gray-200 text-right\">Amount</th>\n"));
    }
    out.push(Frag::Raw("</tr></thead>\n<tbody>\n"));

    let mut row = vec![Frag::Raw("\n<tr>\n")];
    if describe {
        row.extend([
            Frag::Raw("<td class=\"border p-2\">"),
            Frag::Expr(Expr::ItemField("label")),
            Frag::Raw("</td>\n"),
        ]);
    }
    if amount {
        row.extend([
            Frag::Raw("<td class=\"border p-2 text-right\">$"),
            Frag::Expr(Expr::ItemMoney("amount")),
            Frag::Raw("</td>\n"),
        ]);
    }
    row.push(Frag::Raw("</tr>\n"));

    let path = if table.loop_variable.is_empty() {
        DEFAULT_ITEMS_LOOP.to_string()
    } else {
        table.loop_variable.clone()
    };
    out.push(Frag::Each { path, body: row });
    out.push(Frag::Raw("\n</tbody></table>\n"));
    out
}

fn totals_frags(totals: &InvoiceTotals) -> Vec<Frag> {
    let mut out = vec![Frag::Raw("<table><tbody>")];
    if totals.show_subtotal {
        out.extend([
            Frag::Raw(r#"<tr><td class="bold">Sub-Total:</td><td class="text-right">$"#),
            Frag::Expr(Expr::Money("invoice.total")),
            Frag::Raw("</td></tr>"),
        ]);
    }
    if totals.show_total {
        out.extend([
            Frag::Raw(r#"<tr><td class="bold">Total USD:</td><td class="text-right bold">$"#),
            Frag::Expr(Expr::Money("invoice.total")),
            Frag::Raw("</td></tr>"),
        ]);
    }
    out.push(Frag::Raw("</tbody></table>"));
    out
}

const PAYMENT_ROWS: [(&str, &str); 7] = [
    ("<tr><td><b>Bank Country:</b></td><td>", "bankInfo.bank_country"),
    ("<tr><td><b>Bank:</b></td><td>", "bankInfo.bank_name"),
    ("<tr><td><b>SWIFT/BIC Code:</b></td><td>", "bankInfo.bank_swift"),
    ("<tr><td><b>Account Number:</b></td><td>", "bankInfo.bank_account"),
    ("<tr><td><b>Account Name:</b></td><td>", "user.name"),
    ("<tr><td><b>Address:</b></td><td>", "user.address"),
    ("<tr><td><b>Phone:</b></td><td>", "user.phone"),
];

fn payment_info_frags() -> Vec<Frag> {
    let mut table = vec![Frag::Raw(r#"<table style="margin-top: 10px;">"#)];
    for (label, path) in PAYMENT_ROWS {
        table.extend([
            Frag::Raw(label),
            Frag::Expr(Expr::Path(path)),
            Frag::Raw("</td></tr>"),
        ]);
    }
    table.push(Frag::Raw("</table>"));
    vec![
        Frag::Raw(r#"<div style="margin-top: 20px;"><div class="bold">Payment Options:</div>"#),
        Frag::If {
            cond: Cond::Truthy("bankInfo"),
            then: table,
            otherwise: Some(vec![Frag::Raw(
                "<p><em>No bank information assigned to this client.</em></p>",
            )]),
        },
        Frag::Raw("</div>"),
    ]
}

fn access(path: &str) -> String {
    path_to_template_expr(path).unwrap_or_default()
}

/// Prints fragments as template source.
pub fn publish(frags: &[Frag]) -> String {
    let mut out = String::new();
    for frag in frags {
        publish_into(frag, &mut out);
    }
    out
}

fn publish_into(frag: &Frag, out: &mut String) {
    match frag {
        Frag::Raw(raw) => out.push_str(raw),
        Frag::Text(text) => out.push_str(&escape_html(text)),
        Frag::Expr(expr) => {
            let source = match expr {
                Expr::Path(path) => access(path),
                Expr::Date(path) => format!(
                    r#"\Carbon\Carbon::parse({})->format("d/m/Y")"#,
                    access(path)
                ),
                Expr::Money(path) => format!("number_format({}, 2)", access(path)),
                Expr::ItemField(field) => format!("$item->{}", field),
                Expr::ItemMoney(field) => format!("number_format($item->{}, 2)", field),
            };
            out.push_str("{{ ");
            out.push_str(&source);
            out.push_str(" }}");
        }
        Frag::If {
            cond,
            then,
            otherwise,
        } => {
            match cond {
                Cond::Truthy(path) => out.push_str(&format!("@if({})", access(path))),
                Cond::NotEmpty(path) => out.push_str(&format!("@if(!empty({}))", access(path))),
            }
            out.push_str(&publish(then));
            if let Some(otherwise) = otherwise {
                out.push_str("@else");
                out.push_str(&publish(otherwise));
            }
            out.push_str("@endif");
        }
        Frag::Each { path, body } => {
            out.push_str(&format!("@foreach({} as $item)", access(path)));
            out.push_str(&publish(body));
            out.push_str("@endforeach");
        }
    }
}

/// Evaluates fragments against a mock value tree.
pub fn preview(frags: &[Frag], data: &Value) -> String {
    let mut out = String::new();
    for frag in frags {
        preview_into(frag, data, None, &mut out);
    }
    out
}

fn preview_into(frag: &Frag, data: &Value, item: Option<&Value>, out: &mut String) {
    match frag {
        Frag::Raw(raw) => out.push_str(raw),
        Frag::Text(text) => out.push_str(&escape_html(text)),
        Frag::Expr(expr) => {
            let text = match expr {
                Expr::Path(path) => walk(data, path).map(stringify).unwrap_or_default(),
                Expr::Date(path) => walk(data, path).map(format_date).unwrap_or_default(),
                Expr::Money(path) => {
                    number_format(walk(data, path).and_then(as_number).unwrap_or(0.0))
                }
                Expr::ItemField(field) => item
                    .and_then(|item| item.get(*field))
                    .map(stringify)
                    .unwrap_or_default(),
                Expr::ItemMoney(field) => number_format(
                    item.and_then(|item| item.get(*field))
                        .and_then(as_number)
                        .unwrap_or(0.0),
                ),
            };
            out.push_str(&escape_html(&text));
        }
        Frag::If {
            cond,
            then,
            otherwise,
        } => {
            let path = match cond {
                Cond::Truthy(path) | Cond::NotEmpty(path) => path,
            };
            let branch = if is_truthy(walk(data, path)) {
                Some(then)
            } else {
                otherwise.as_ref()
            };
            for frag in branch.into_iter().flatten() {
                preview_into(frag, data, item, out);
            }
        }
        Frag::Each { path, body } => {
            for entry in iterate(walk(data, path)) {
                for frag in body {
                    preview_into(frag, data, Some(entry), out);
                }
            }
        }
    }
}

/// Items a template `@foreach` would visit.
pub(crate) fn iterate(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(map)) => map.values().collect(),
        _ => Vec::new(),
    }
}

/// Template-language truthiness of a looked-up value.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty() && s != "0",
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// `number_format(x, 2)`: comma thousands separator, two decimals.
pub fn number_format(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac)
}

/// `YYYY-MM-DD...` as `DD/MM/YYYY`. Anything else is printed as is.
fn format_date(value: &Value) -> String {
    let raw = stringify(value);
    let date = raw.get(..10).unwrap_or(&raw);
    let parts: Vec<&str> = date.split('-').collect();
    match parts.as_slice() {
        [y, m, d]
            if y.len() == 4
                && m.len() == 2
                && d.len() == 2
                && date.chars().all(|c| c.is_ascii_digit() || c == '-') =>
        {
            format!("{}/{}/{}", d, m, y)
        }
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn mock() -> Value {
        json!({
            "invoice": {
                "invoice_no": "INV-1",
                "invoice_date": "2024-01-15",
                "due_date": "2024-02-15",
                "total": 1625.0,
                "other_expenses": [
                    {"label": "Setup Fee", "amount": "100.00"},
                    {"label": "Processing <Fee>", "amount": 1234.5}
                ]
            },
            "client": {"name": "ABC", "address": "1 Road", "tax": ""},
            "user": {"name": "Jo", "address": "2 Lane", "phone": "555"},
            "bankInfo": {}
        })
    }

    #[test]
    fn test_totals_publish_and_preview() {
        let frags = totals_frags(&InvoiceTotals {
            show_subtotal: false,
            show_total: true,
        });
        assert_eq!(
            publish(&frags),
            r#"<table><tbody><tr><td class="bold">Total USD:</td><td class="text-right bold">${{ number_format($invoice->total, 2) }}</td></tr></tbody></table>"#
        );
        assert_eq!(
            preview(&frags, &mock()),
            r#"<table><tbody><tr><td class="bold">Total USD:</td><td class="text-right bold">$1,625.00</td></tr></tbody></table>"#
        );
    }

    #[test]
    fn test_items_preview_repeats_rows() {
        let frags = items_table_frags(&InvoiceItemsTable {
            columns: ItemColumn::ALL.to_vec(),
            loop_variable: String::new(),
        });
        assert_eq!(
            preview(&frags, &mock()),
            concat!(
                "<table class=\"w-full border-collapse\">\n<thead><tr>\n",
                "<th class=\"border p-2 bg-gray-200\">Description</th>\n",
                "<th class=\"border p-2 bg-gray-200 text-right\">Amount</th>\n",
                "</tr></thead>\n<tbody>\n",
                "\n<tr>\n<td class=\"border p-2\">Setup Fee</td>\n",
                "<td class=\"border p-2 text-right\">$100.00</td>\n</tr>\n",
                "\n<tr>\n<td class=\"border p-2\">Processing &lt;Fee&gt;</td>\n",
                "<td class=\"border p-2 text-right\">$1,234.50</td>\n</tr>\n",
                "\n</tbody></table>\n",
            )
        );
    }

    #[test]
    fn test_info_table_preview_skips_empty_tax_and_formats_dates() {
        let frags = info_table_frags(&InvoiceInfoTable {
            show_client_info: true,
            show_invoice_details: true,
        });
        let html = preview(&frags, &mock());
        assert!(html.contains("<div>1 Road</div></td>"));
        assert!(html.contains("<strong>Date:</strong> 15/01/2024"));
        assert!(html.contains("<strong>Due:</strong> 15/02/2024"));
    }

    #[test]
    fn test_payment_info_preview_uses_else_branch_for_empty_bank() {
        let html = preview(&payment_info_frags(), &mock());
        assert_eq!(
            html,
            r#"<div style="margin-top: 20px;"><div class="bold">Payment Options:</div><p><em>No bank information assigned to this client.</em></p></div>"#
        );
    }

    #[test]
    fn test_number_format() {
        assert_eq!(number_format(0.0), "0.00");
        assert_eq!(number_format(999.999), "1,000.00");
        assert_eq!(number_format(1234567.891), "1,234,567.89");
        assert_eq!(number_format(-42.5), "-42.50");
        assert_eq!(number_format(-0.001), "0.00");
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!("0"))));
        assert!(!is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!("no"))));
        assert!(is_truthy(Some(&json!({"a": 1}))));
    }
}
