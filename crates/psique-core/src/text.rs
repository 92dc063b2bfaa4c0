//! Text helpers for list filters, prompts and exports.

use std::collections::{HashMap, HashSet};

/// Tags the evolution editor produces.
const RICH_TEXT_TAGS: &[&str] = &[
    "p", "br", "strong", "b", "em", "i", "u", "s", "h1", "h2", "h3", "ul", "ol", "li",
    "blockquote", "a",
];

/// Lowercase and strip the Latin diacritics used in Portuguese names so that
/// "joão" matches "JOAO".
pub fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Whether every whitespace-separated term of `query` occurs in `text`,
/// ignoring case and accents.
pub fn matches_query(text: &str, query: &str) -> bool {
    let haystack = fold(text);
    fold(query)
        .split_whitespace()
        .all(|term| haystack.contains(term))
}

/// Drop editor markup from rich text, keeping paragraph breaks.
pub fn plain_text(rich: &str) -> String {
    let mut out = String::with_capacity(rich.len());
    let mut in_tag = false;
    let mut tag = String::new();
    for c in rich.chars() {
        match c {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let name = tag.trim_start_matches('/').split_whitespace().next().unwrap_or("");
                if matches!(name, "p" | "br" | "br/" | "li" | "div") && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ if in_tag => tag.push(c),
            _ => out.push(c),
        }
    }
    out.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reduce editor HTML to the tags the editor emits. Scripts, styles, event
/// handler attributes and `javascript:` links are removed; links only keep
/// `href`.
pub fn sanitize_rich_text(html: &str) -> String {
    ammonia::Builder::default()
        .tags(RICH_TEXT_TAGS.iter().copied().collect())
        .generic_attributes(HashSet::new())
        .tag_attributes(HashMap::from([("a", HashSet::from(["href"]))]))
        .url_schemes(HashSet::from(["http", "https", "mailto"]))
        .link_rel(Some("noopener noreferrer"))
        .clean(html)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_and_case() {
        assert_eq!(fold("João Conceição"), "joao conceicao");
    }

    #[test]
    fn query_terms_match_in_any_order() {
        assert!(matches_query("Maria José da Silva", "silva JOSE"));
        assert!(!matches_query("Maria José da Silva", "souza"));
        assert!(matches_query("anything", "   "));
    }

    #[test]
    fn sanitizing_strips_scripts_and_handlers() {
        let clean = sanitize_rich_text(
            r#"<p onclick="steal()">Relata <strong>melhora</strong>.</p><script>alert(1)</script><img src=x onerror="alert(1)"><a href="javascript:alert(1)">x</a>"#,
        );
        assert!(!clean.contains("<script"));
        assert!(!clean.contains("alert"));
        assert!(!clean.contains("onerror"));
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("<img"));
        assert!(clean.contains("<p>Relata <strong>melhora</strong>.</p>"));
    }

    #[test]
    fn sanitizing_keeps_editor_markup() {
        let html = "<h2>Queixa</h2><ul><li>insônia</li></ul><p><em>leve</em></p>";
        assert_eq!(sanitize_rich_text(html), html);
    }

    #[test]
    fn markup_is_removed() {
        assert_eq!(
            plain_text("<p>Paciente relata <strong>ansiedade</strong>.</p><p>Sono&nbsp;irregular.</p>"),
            "Paciente relata ansiedade.\nSono irregular."
        );
        assert_eq!(plain_text("texto simples"), "texto simples");
    }
}
