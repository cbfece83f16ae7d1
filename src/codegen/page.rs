const PREVIEW_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Template Preview</title>
    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }
        body {
            font-family: Times New Roman, serif;
            font-size: 12px;
            color: #000;
            background-color: #f5f5f5;
            padding: 20px;
            min-height: 100vh;
        }
        .page-container {
            max-width: 1200px;
            margin: 0 auto;
            background-color: #fff;
            padding: 40px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }
        .page-container > * {
            margin-bottom: 15px;
        }
        .page-container > *:last-child {
            margin-bottom: 0;
        }
        h2 { font-size: 2rem; margin: 20px 0; }
        p { margin: 10px 0; line-height: 1.6; }
        img { max-width: 100%; height: auto; display: block; }
        button { background: #3b82f6; color: white; padding: 10px 20px; border: none; border-radius: 4px; cursor: pointer; }
        table { border-collapse: collapse; width: 100%; }
        th, td { border: 1px solid #000; padding: 6px; }
        th { background: #e6e6e6; }
        .text-right { text-align: right; }
        .bold { font-weight: bold; }
    </style>
</head>
<body>
    <div class="page-container">
"#;

const PREVIEW_TAIL: &str = r#"
    </div>
</body>
</html>"#;

const PUBLISH_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Invoice {{ $invoice->invoice_no ?? "Invoice" }}</title>
    <style>
        body {
            font-family: Times New Roman, serif;
            padding: 40px;
            font-size: 12px;
            color: #000;
            background-color: #fff;
        }
        .header {
            border-bottom: 3px solid #000;
            padding-bottom: 10px;
            margin-bottom: 20px;
        }
        .invoice-title {
            font-size: 2rem;
            font-weight: bold;
            text-transform: uppercase;
            letter-spacing: 1px;
        }
        .info {
            margin-top: 5px;
        }
        table {
            border-collapse: collapse;
            width: 100%;
        }
        th, td {
            border: 1px solid #000;
            padding: 6px;
        }
        th {
            background: #e6e6e6;
        }
        .text-right { text-align: right; }
        .bold { font-weight: bold; }
    </style>
</head>
<body>"#;

const PUBLISH_TAIL: &str = "\n</body>\n</html>";

/// Standalone preview document around generated preview markup.
pub fn preview_page(fragment: &str) -> String {
    [PREVIEW_HEAD, fragment, PREVIEW_TAIL].concat()
}

/// Invoice template document around generated publish markup.
pub fn publish_page(fragment: &str) -> String {
    [PUBLISH_HEAD, fragment, PUBLISH_TAIL].concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_page_wraps_fragment() {
        let page = preview_page("<p>x</p>");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Template Preview</title>"));
        assert!(page.contains("<div class=\"page-container\">\n<p>x</p>\n    </div>"));
    }

    #[test]
    fn test_publish_page_wraps_fragment() {
        let page = publish_page("<p>x</p>");
        assert!(page.contains(r#"<title>Invoice {{ $invoice->invoice_no ?? "Invoice" }}</title>"#));
        assert!(page.ends_with("<body><p>x</p>\n</body>\n</html>"));
    }
}
