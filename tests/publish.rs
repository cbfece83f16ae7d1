use page_builder::element::{InvoiceHeader, InvoiceItemsTable, InvoiceTotals, ItemColumn, LoopContent};
use page_builder::variables::path_to_template_expr;
use page_builder::{BuilderConfig, Element, ElementContent, ElementId, ElementType, Generator, VariableCatalog};
use pretty_assertions::assert_eq;

fn catalog() -> VariableCatalog {
    VariableCatalog::from_config(&BuilderConfig::embedded().unwrap().catalog)
}

fn publish(element: Element) -> String {
    Generator::new(&catalog()).publish(&[element])
}

fn element(kind: ElementType) -> Element {
    Element::new(ElementId(1), kind)
}

#[test]
fn test_invoice_header_fragment() {
    let mut header = element(ElementType::InvoiceHeader);
    header.content = ElementContent::InvoiceHeader(InvoiceHeader {
        title: "Invoice".to_string(),
        show_user_info: true,
    });
    assert_eq!(
        publish(header.clone()),
        r#"<div class="header"><div class="invoice-title">Invoice</div><div class="info"><strong>{{ $user->name }}</strong><br>{{ $user->address }}</div></div>"#
    );

    header.content = ElementContent::InvoiceHeader(InvoiceHeader {
        title: "Tax & Fees".to_string(),
        show_user_info: false,
    });
    assert_eq!(
        publish(header),
        r#"<div class="header"><div class="invoice-title">Tax &amp; Fees</div></div>"#
    );
}

#[test]
fn test_invoice_info_table_fragment() {
    assert_eq!(
        publish(element(ElementType::InvoiceInfoTable)),
        concat!(
            r#"<table style="margin-bottom: 20px;"><tr>"#,
            r#"<td><div class="bold" style="color: darkred;">Invoice To:</div><div class="bold">{{ $client->name }}</div><div>{{ $client->address }}</div>@if(!empty($client->tax))<div>{{ $client->tax }}</div>@endif</td>"#,
            r#"<td class="text-right"><div><strong>Invoice #:</strong> {{ $invoice->invoice_no }}</div><div><strong>Date:</strong> {{ \Carbon\Carbon::parse($invoice->invoice_date)->format("d/m/Y") }}</div><div><strong>Due:</strong> {{ \Carbon\Carbon::parse($invoice->due_date)->format("d/m/Y") }}</div></td>"#,
            r#"</tr></table>"#,
        )
    );
}

fn items_table(columns: Vec<ItemColumn>) -> Element {
    let mut table = element(ElementType::InvoiceItemsTable);
    table.content = ElementContent::InvoiceItemsTable(InvoiceItemsTable {
        columns,
        loop_variable: String::new(),
    });
    table
}

const ITEMS_OPEN: &str = "<table class=\"w-full border-collapse\">\n<thead><tr>\n";
const DESCRIPTION_HEAD: &str = "<th class=\"border p-2 bg-gray-200\">Description</th>\n";
const AMOUNT_HEAD: &str = "<th class=\"border p-2 bg-gray-200 text-right\">Amount</th>\n";
const ITEMS_LOOP: &str =
    "</tr></thead>\n<tbody>\n@foreach($invoice->other_expenses as $item)\n<tr>\n";
const DESCRIPTION_CELL: &str = "<td class=\"border p-2\">{{ $item->label }}</td>\n";
const AMOUNT_CELL: &str =
    "<td class=\"border p-2 text-right\">${{ number_format($item->amount, 2) }}</td>\n";
const ITEMS_CLOSE: &str = "</tr>\n@endforeach\n</tbody></table>\n";

#[test]
fn test_invoice_items_table_fragment() {
    assert_eq!(
        publish(element(ElementType::InvoiceItemsTable)),
        [
            ITEMS_OPEN,
            DESCRIPTION_HEAD,
            AMOUNT_HEAD,
            ITEMS_LOOP,
            DESCRIPTION_CELL,
            AMOUNT_CELL,
            ITEMS_CLOSE,
        ]
        .concat()
    );
    assert_eq!(
        publish(items_table(vec![ItemColumn::Amount])),
        [ITEMS_OPEN, AMOUNT_HEAD, ITEMS_LOOP, AMOUNT_CELL, ITEMS_CLOSE].concat()
    );
    assert_eq!(
        publish(items_table(vec![ItemColumn::Description])),
        [ITEMS_OPEN, DESCRIPTION_HEAD, ITEMS_LOOP, DESCRIPTION_CELL, ITEMS_CLOSE].concat()
    );
    assert_eq!(
        publish(items_table(Vec::new())),
        [ITEMS_OPEN, ITEMS_LOOP, ITEMS_CLOSE].concat()
    );
}

#[test]
fn test_items_table_custom_loop_path() {
    let mut table = items_table(vec![ItemColumn::Description]);
    if let ElementContent::InvoiceItemsTable(items) = &mut table.content {
        items.loop_variable = "invoice.line_items".to_string();
    }
    assert!(publish(table).contains("@foreach($invoice->line_items as $item)\n<tr>\n"));
}

#[test]
fn test_invoice_totals_fragment() {
    let mut totals = element(ElementType::InvoiceTotals);
    assert_eq!(
        publish(totals.clone()),
        concat!(
            r#"<table><tbody>"#,
            r#"<tr><td class="bold">Sub-Total:</td><td class="text-right">${{ number_format($invoice->total, 2) }}</td></tr>"#,
            r#"<tr><td class="bold">Total USD:</td><td class="text-right bold">${{ number_format($invoice->total, 2) }}</td></tr>"#,
            r#"</tbody></table>"#,
        )
    );

    totals.content = ElementContent::InvoiceTotals(InvoiceTotals {
        show_subtotal: false,
        show_total: false,
    });
    assert_eq!(publish(totals), "<table><tbody></tbody></table>");
}

#[test]
fn test_invoice_payment_info_fragment() {
    assert_eq!(
        publish(element(ElementType::InvoicePaymentInfo)),
        concat!(
            r#"<div style="margin-top: 20px;"><div class="bold">Payment Options:</div>@if($bankInfo)<table style="margin-top: 10px;">"#,
            r#"<tr><td><b>Bank Country:</b></td><td>{{ $bankInfo->bank_country }}</td></tr>"#,
            r#"<tr><td><b>Bank:</b></td><td>{{ $bankInfo->bank_name }}</td></tr>"#,
            r#"<tr><td><b>SWIFT/BIC Code:</b></td><td>{{ $bankInfo->bank_swift }}</td></tr>"#,
            r#"<tr><td><b>Account Number:</b></td><td>{{ $bankInfo->bank_account }}</td></tr>"#,
            r#"<tr><td><b>Account Name:</b></td><td>{{ $user->name }}</td></tr>"#,
            r#"<tr><td><b>Address:</b></td><td>{{ $user->address }}</td></tr>"#,
            r#"<tr><td><b>Phone:</b></td><td>{{ $user->phone }}</td></tr>"#,
            r#"</table>@else<p><em>No bank information assigned to this client.</em></p>@endif</div>"#,
        )
    );
}

#[test]
fn test_loop_path_translation_has_no_braces() {
    assert_eq!(
        path_to_template_expr("invoice.other_expenses").unwrap(),
        "$invoice->other_expenses"
    );
}

#[test]
fn test_empty_loop_publishes_nothing() {
    let mut block = element(ElementType::Loop);
    block.content = ElementContent::Loop(LoopContent {
        loop_variable: String::new(),
        item_variable: "item".to_string(),
        content: vec![element(ElementType::Text)],
    });
    assert_eq!(publish(block), "");
}

#[test]
fn test_preview_resolves_currency() {
    let catalog = catalog();
    assert_eq!(
        catalog.resolve_preview("invoice.total"),
        Some("$1625.00".to_string())
    );
    let mut text = element(ElementType::Text);
    text.set_text("Due: ((invoice.total)) ((no.such))");
    text.styles = Default::default();
    assert_eq!(
        Generator::new(&catalog).preview(&[text]),
        "<p>Due: $1625.00 ((no.such))</p>"
    );
}

#[test]
fn test_publish_escapes_literal_text() {
    let mut text = element(ElementType::Text);
    text.set_text("Tax & <Fees> ((invoice.total))");
    text.styles = Default::default();
    assert_eq!(
        publish(text),
        "<p>Tax &amp; &lt;Fees&gt; {{ $invoice->total }}</p>"
    );
}
