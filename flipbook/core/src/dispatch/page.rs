//! Browser landing page

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>🦭 Flipbook ASCII Animations</title>
    <style>
        body {
            background: #000;
            color: #0f0;
            font-family: 'Courier New', monospace;
            margin: 0;
            padding: 20px;
            text-align: center;
        }
        .container { max-width: 800px; margin: 0 auto; }
        pre {
            font-size: 14px;
            line-height: 1.2;
            white-space: pre;
            background: #111;
            padding: 20px;
            border-radius: 8px;
            margin: 20px 0;
        }
        code {
            background: #222;
            padding: 4px 8px;
            border-radius: 4px;
            color: #ff6;
        }
        h1 { color: #4af; }
        a { color: #4af; }
    </style>
</head>
<body>
    <div class="container">
        <h1>🦭 Wiggling Seal Animation</h1>
        <p>Use curl to view the animation:</p>
        <pre><code>curl {{base}}</code></pre>
        <p>Available animations: {{animations}}</p>
        <p>Or list them as JSON:</p>
        <pre><code>curl {{base}}/list</code></pre>
        <p><a href="{{list_href}}">View available animations</a></p>
    </div>
</body>
</html>
"#;

/// Render the landing page for a given public base URL
///
/// `base` is typically `http://<host><mount>` taken from the request, so it
/// is escaped before being placed in the markup.
#[must_use]
pub fn render_landing_page(base: &str, list_href: &str, animations: &[&str]) -> String {
    let names = animations
        .iter()
        .map(|name| format!("<code>{}</code>", escape_html(name)))
        .collect::<Vec<_>>()
        .join(" ");

    TEMPLATE
        .replace("{{base}}", &escape_html(base))
        .replace("{{list_href}}", &escape_html(list_href))
        .replace("{{animations}}", &names)
}

/// Escape the five HTML-significant characters
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_names_host_and_animations() {
        let page = render_landing_page("http://example.com", "/list", &["otter", "seal"]);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("curl http://example.com</code>"));
        assert!(page.contains("curl http://example.com/list</code>"));
        assert!(page.contains("<code>otter</code> <code>seal</code>"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn test_host_is_escaped() {
        let page = render_landing_page("http://<script>", "/list", &[]);
        assert!(page.contains("http://&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }
}
