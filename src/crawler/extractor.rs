//! Link, sub-resource and form extraction from HTML content

use super::browser::ResourceType;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// An HTML form with the values a user would plausibly submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredForm {
    pub action: Url,
    /// Uppercase HTTP method (GET or POST)
    pub method: String,
    pub fields: Vec<(String, String)>,
}

/// Extracts absolute URLs from `a[href]` elements
pub fn extract_links(base_url: &Url, html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut urls = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(value) = element.value().attr("href") {
                if let Some(resolved) = resolve_url(base_url, value) {
                    urls.push(resolved.to_string());
                }
            }
        }
    }

    urls
}

/// Extracts the sub-resources a browser would load alongside the page
pub fn extract_subresources(base_url: &Url, html: &str) -> Vec<(Url, ResourceType)> {
    let document = Html::parse_document(html);
    let mut resources = Vec::new();

    let selectors = [
        ("script[src]", "src", ResourceType::Script),
        ("link[rel=stylesheet][href]", "href", ResourceType::Stylesheet),
        ("img[src]", "src", ResourceType::Image),
        ("video[src]", "src", ResourceType::Media),
        ("audio[src]", "src", ResourceType::Media),
        ("iframe[src]", "src", ResourceType::Document),
    ];

    for (sel_str, attr, resource_type) in &selectors {
        if let Ok(selector) = Selector::parse(sel_str) {
            for element in document.select(&selector) {
                if let Some(value) = element.value().attr(attr) {
                    if let Some(resolved) = resolve_url(base_url, value) {
                        resources.push((resolved, *resource_type));
                    }
                }
            }
        }
    }

    resources
}

/// Extracts forms with their action, method and mock-filled fields
pub fn extract_forms(base_url: &Url, html: &str) -> Vec<DiscoveredForm> {
    let document = Html::parse_document(html);
    let mut forms = Vec::new();

    let (Ok(form_sel), Ok(field_sel)) = (
        Selector::parse("form"),
        Selector::parse("input[name], textarea[name], select[name]"),
    ) else {
        return forms;
    };

    for form in document.select(&form_sel) {
        let action = match form.value().attr("action").map(str::trim) {
            None | Some("") | Some("#") => Some(base_url.clone()),
            Some(raw) => resolve_url(base_url, raw),
        };
        let Some(action) = action else {
            continue;
        };

        let method = match form.value().attr("method") {
            Some(m) if m.eq_ignore_ascii_case("post") => "POST",
            _ => "GET",
        }
        .to_string();

        let fields: Vec<(String, String)> = form
            .select(&field_sel)
            .filter_map(|field| {
                let name = field.value().attr("name")?;
                mock_value(&field).map(|v| (name.to_string(), v))
            })
            .collect();

        if !fields.is_empty() {
            forms.push(DiscoveredForm {
                action,
                method,
                fields,
            });
        }
    }

    forms
}

/// Picks a plausible value for a form control; None for controls that are never submitted as text
fn mock_value(field: &ElementRef<'_>) -> Option<String> {
    let element = field.value();

    if element.name() == "select" {
        let option = Selector::parse("option").ok()?;
        let first = field.select(&option).next();
        return Some(
            first
                .and_then(|o| o.value().attr("value").map(str::to_string))
                .or_else(|| first.map(|o| o.text().collect::<String>().trim().to_string()))
                .unwrap_or_default(),
        );
    }

    let input_type = element.attr("type").unwrap_or("text").to_lowercase();
    if matches!(
        input_type.as_str(),
        "submit" | "button" | "reset" | "image" | "file"
    ) {
        return None;
    }

    if let Some(value) = element.attr("value").filter(|v| !v.is_empty()) {
        return Some(value.to_string());
    }

    Some(
        match input_type.as_str() {
            "email" => "test@example.com",
            "number" | "range" => "1",
            "tel" => "5555555555",
            "url" => "http://example.com",
            "password" => "Passw0rd!",
            "checkbox" | "radio" => "on",
            _ => "test",
        }
        .to_string(),
    )
}

/// Resolves a potentially relative URL against a base URL
pub fn resolve_url(base_url: &Url, raw: &str) -> Option<Url> {
    let trimmed = raw.trim();

    if trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("mailto:")
        || trimmed.starts_with("tel:")
        || trimmed.starts_with("javascript:")
        || trimmed.starts_with("data:")
    {
        return None;
    }

    let mut resolved = base_url.join(trimmed).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/app/").expect("valid url")
    }

    #[test]
    fn test_extract_links() {
        let html = r##"
            <html>
            <body>
                <a href="/about">About</a>
                <a href="contact">Contact</a>
                <a href="https://external.com/page">External</a>
                <a href="/docs#intro">Docs</a>
                <a href="javascript:void(0)">Skip</a>
                <a href="#">Skip</a>
                <a>No href</a>
            </body>
            </html>
        "##;

        let urls = extract_links(&base(), html);
        assert!(urls.contains(&"https://example.com/about".to_string()));
        assert!(urls.contains(&"https://example.com/app/contact".to_string()));
        assert!(urls.contains(&"https://external.com/page".to_string()));
        assert!(urls.contains(&"https://example.com/docs".to_string()));
        assert_eq!(urls.len(), 4);
    }

    #[test]
    fn test_extract_subresources() {
        let html = r#"
            <link rel="stylesheet" href="/css/site.css">
            <script src="/js/app.js"></script>
            <img src="logo.png">
        "#;

        let resources = extract_subresources(&base(), html);
        assert!(resources.iter().any(|(u, t)| u.path() == "/css/site.css"
            && *t == ResourceType::Stylesheet));
        assert!(resources
            .iter()
            .any(|(u, t)| u.path() == "/js/app.js" && *t == ResourceType::Script));
        assert!(resources
            .iter()
            .any(|(u, t)| u.path() == "/app/logo.png" && *t == ResourceType::Image));
    }

    #[test]
    fn test_extract_forms_with_mock_values() {
        let html = r#"
            <form action="/login" method="post">
                <input name="email" type="email">
                <input name="password" type="password">
                <input name="remember" type="hidden" value="yes">
                <input type="submit" name="go" value="Sign in">
            </form>
            <form>
                <input name="q">
                <select name="lang"><option value="en">English</option></select>
            </form>
            <form action="/empty"><button>Nothing</button></form>
        "#;

        let forms = extract_forms(&base(), html);
        assert_eq!(forms.len(), 2);

        let login = &forms[0];
        assert_eq!(login.action.as_str(), "https://example.com/login");
        assert_eq!(login.method, "POST");
        assert_eq!(
            login.fields,
            vec![
                ("email".to_string(), "test@example.com".to_string()),
                ("password".to_string(), "Passw0rd!".to_string()),
                ("remember".to_string(), "yes".to_string()),
            ]
        );

        let search = &forms[1];
        assert_eq!(search.action, base());
        assert_eq!(search.method, "GET");
        assert_eq!(
            search.fields,
            vec![
                ("q".to_string(), "test".to_string()),
                ("lang".to_string(), "en".to_string()),
            ]
        );
    }

    #[test]
    fn test_resolve_url_skips_pseudo_schemes() {
        assert!(resolve_url(&base(), "mailto:a@b.c").is_none());
        assert!(resolve_url(&base(), "tel:123").is_none());
        assert!(resolve_url(&base(), "  ").is_none());
        assert_eq!(
            resolve_url(&base(), "../x?y=1#z").map(|u| u.to_string()),
            Some("https://example.com/x?y=1".to_string())
        );
    }
}
