//! Page shell hosting the widget.

/// Wrap `widget_html` in a minimal HTML document that loads HTMX.
#[must_use]
pub fn page(widget_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Datafish</title>
    <script src="https://unpkg.com/htmx.org@2.0.8"></script>
    <script src="https://unpkg.com/htmx-ext-json-enc@2.0.2/json-enc.js"></script>
</head>
<body>
    {widget_html}
</body>
</html>"#
    )
}
