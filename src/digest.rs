//! HTML rendering for the digest emails.

use crate::search::SearchHit;

const CSS_STYLE: &str = r#"<style>
  body { font-family: Arial, sans-serif; line-height: 1.5; }
  .paper-container {
      border: 1px solid #ddd;
      border-radius: 8px;
      padding: 12px;
      margin-bottom: 20px;
      background-color: #f9f9f9;
  }
  .paper-title { font-size: 18px; font-weight: bold; color: #333; margin-bottom: 8px; }
  .paper-novelty { font-size: 14px; font-style: italic; color: #555; margin-bottom: 8px; }
  .paper-content { font-size: 14px; color: #444; white-space: pre-wrap; }
</style>"#;

const MISSING: &str = "N/A";

/// Render the ranked hits as a sequence of paper blocks. Missing fields
/// become a literal "N/A", never an omission and never an error.
pub fn results_fragment(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "<p>No recent papers matched this topic.</p>".to_string();
    }

    let mut parts = vec![];
    for (idx, hit) in hits.iter().enumerate() {
        let entity = &hit.hit.entity;
        let title = entity.title_paper.as_deref().unwrap_or(MISSING);
        let novelty = entity.novelty.as_deref().unwrap_or(MISSING);
        let content = entity.content.as_deref().unwrap_or(MISSING);
        let pdf_url = entity.pdf_url.as_deref().unwrap_or(MISSING);

        parts.push(format!(
            r#"<div class="paper-container">
  <div class="paper-title">{n}. {title}</div>
  <div class="paper-novelty"><strong>Novelty:</strong> {novelty}</div>
  <div class="paper-content"><strong>Summary:</strong><br>{content}</div>
  <a href="{pdf_url}">Read the paper on arXiv</a>
</div>"#,
            n = idx + 1,
        ));
    }

    parts.join("")
}

/// Wrap a rendered fragment in the full digest document, personalized with
/// the recipient's display name and topic.
pub fn digest_html(name: &str, topic: &str, fragment: &str) -> String {
    format!(
        r#"<html>
<head>
  <meta charset="UTF-8">
  {CSS_STYLE}
</head>
<body>
  <p>Hello <strong>{name}</strong>!</p>
  <p>Here is a summary of papers related to the keyword <em>{topic}</em>.</p>
  {fragment}
  <p>Best regards,<br>The paperfeed team</p>
</body>
</html>"#
    )
}
