//! JavaScript snippets evaluated in the page.

/// Current `document.readyState`.
pub const READY_STATE: &str = "document.readyState";

/// Expression that is `true` when `text` is visible on the page.
///
/// Matching is case-insensitive on whitespace-normalized text, the same way
/// an unquoted `text=` selector behaves. Text inside `script`, `style`,
/// `noscript` and `template` never counts. The element checked for
/// visibility is the smallest one whose text contains the needle, so a
/// visible wrapper does not vouch for a hidden child. An element is visible
/// when it has a non-empty box and its computed `visibility` is `visible`.
#[must_use]
pub fn text_visible(text: &str) -> String {
    let needle = serde_json::to_string(&normalize(text)).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r"(() => {{
  const needle = {needle};
  if (!document.body) return false;
  const skipped = new Set(['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE']);
  const isSkipped = (el) => skipped.has(el.nodeName.toUpperCase());
  const norm = (s) => (s || '').replace(/\s+/g, ' ').trim().toLowerCase();
  const texts = new Map();
  const textOf = (el) => {{
    if (texts.has(el)) return texts.get(el);
    let raw = '';
    for (const child of el.childNodes) {{
      if (child.nodeType === Node.TEXT_NODE) raw += child.nodeValue;
      else if (child.nodeType === Node.ELEMENT_NODE && !isSkipped(child)) raw += textOf(child);
    }}
    texts.set(el, raw);
    return raw;
  }};
  const matches = (el) => !isSkipped(el) && norm(textOf(el)).includes(needle);
  const visible = (el) => {{
    const style = window.getComputedStyle(el);
    if (style.visibility !== 'visible' || style.display === 'none') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
  }};
  const search = (el) => {{
    let narrower = false;
    for (const child of el.children) {{
      if (!matches(child)) continue;
      narrower = true;
      if (search(child)) return true;
    }}
    return !narrower && visible(el);
  }};
  return matches(document.body) && search(document.body);
}})()"
    )
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
