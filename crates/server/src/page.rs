//! HTML rendering for the prediction form

use efficiency_lib::FEATURE_NAMES;
use std::collections::HashMap;
use std::fmt::Write;

/// Escape text for an HTML body or a double-quoted attribute
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the form with previously submitted values and an optional result line
pub fn render(values: &HashMap<String, String>, result: Option<&str>, modes: &[String]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Machine Efficiency Prediction</title></head>\n<body>\n<h1>Machine Efficiency Prediction</h1>\n<form method=\"post\" action=\"/\">\n",
    );

    for name in FEATURE_NAMES {
        let value = values.get(name).map(String::as_str).unwrap_or("");
        let _ = writeln!(
            html,
            "<label for=\"{n}\">{n}</label> <input type=\"text\" id=\"{n}\" name=\"{n}\" value=\"{v}\"><br>",
            n = escape(name),
            v = escape(value),
        );
    }
    if !modes.is_empty() {
        let listed: Vec<String> = modes.iter().map(|m| escape(m)).collect();
        let _ = writeln!(html, "<p>Operation modes: {}</p>", listed.join(", "));
    }
    html.push_str("<button type=\"submit\">Predict</button>\n</form>\n");

    if let Some(result) = result {
        let _ = writeln!(html, "<h2 id=\"result\">{}</h2>", escape(result));
    }

    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<script>alert(\"x\")</script>&'"),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;&amp;&#x27;"
        );
        assert_eq!(escape("Auto"), "Auto");
    }

    #[test]
    fn test_render_lists_every_field() {
        let html = render(&HashMap::new(), None, &[]);
        for name in FEATURE_NAMES {
            assert!(html.contains(&format!("name=\"{}\"", name)));
        }
        assert!(!html.contains("id=\"result\""));
    }

    #[test]
    fn test_render_echoes_values_escaped() {
        let mut values = HashMap::new();
        values.insert("Temperature_C".to_string(), "\"><b>".to_string());
        let html = render(&values, Some("Error: bad <input>"), &["Auto".to_string()]);
        assert!(html.contains("value=\"&quot;&gt;&lt;b&gt;\""));
        assert!(html.contains("Error: bad &lt;input&gt;"));
        assert!(html.contains("Operation modes: Auto"));
        assert!(!html.contains("<b>"));
    }
}
