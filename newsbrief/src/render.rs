//! Presenter: console, email and archive renderings of a [`Brief`].
//!
//! All renderings are pure functions of the brief and the date format, so the
//! same brief always renders to the same bytes.

use std::fmt::Write;

use crate::brief::{Brief, TopicSection};

const RULE_WIDTH: usize = 80;

/// Rendered email: subject plus HTML body with a plain-text alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailBody {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub struct Presenter {
    date_format: String,
}

impl Presenter {
    /// `date_format` must be a valid strftime pattern (checked by `Config::validate`).
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    fn date(&self, brief: &Brief) -> String {
        brief.generated_at.format(&self.date_format).to_string()
    }

    /// Human-readable console output.
    pub fn console(&self, brief: &Brief) -> String {
        let heavy = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{}", heavy);
        let _ = writeln!(out, "DAILY NEWS BRIEF");
        let _ = writeln!(out, "{}", heavy);
        let _ = writeln!(out, "Date: {}", self.date(brief));

        for section in &brief.topics {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", heavy);
            let _ = writeln!(out, "{}", section.topic.to_uppercase());
            let _ = writeln!(out, "{}", heavy);
            let _ = writeln!(out);
            write_plain_items(&mut out, section, "   Link: ");
        }

        let _ = writeln!(out, "{}", heavy);
        let _ = writeln!(out, "Total articles: {}", brief.article_count());
        out
    }

    /// Plain-text archive document.
    pub fn archive(&self, brief: &Brief) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Daily News Brief - {}", self.date(brief));
        let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
        let _ = writeln!(out);

        for section in &brief.topics {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", section.topic.to_uppercase());
            let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
            let _ = writeln!(out);
            write_plain_items(&mut out, section, "   ");
        }

        let _ = writeln!(out, "Total articles: {}", brief.article_count());
        out
    }

    /// HTML email with plain-text fallback.
    pub fn email(&self, brief: &Brief) -> EmailBody {
        let date = self.date(brief);
        EmailBody {
            subject: format!("News Brief \u{2013} {}", date),
            html: self.html(brief, &date),
            text: self.archive(brief),
        }
    }

    fn html(&self, brief: &Brief, date: &str) -> String {
        let mut out = String::new();

        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(out, "<title>News Brief - {}</title>", escape_html(date));
        out.push_str(
            "<style>\n\
             body { font-family: Arial, Helvetica, sans-serif; line-height: 1.5; color: #222; max-width: 720px; margin: 0 auto; padding: 16px; }\n\
             h1 { border-bottom: 2px solid #333; padding-bottom: 8px; }\n\
             h2 { margin-top: 32px; color: #1a4d8f; }\n\
             .article { margin-bottom: 20px; }\n\
             .article p { margin: 4px 0; }\n\
             .empty { color: #888; font-style: italic; }\n\
             .footer { margin-top: 32px; color: #666; font-size: 0.9em; }\n\
             </style>\n",
        );
        out.push_str("</head>\n<body>\n");
        let _ = writeln!(out, "<h1>Daily News Brief</h1>");
        let _ = writeln!(out, "<p>{}</p>", escape_html(date));

        for section in &brief.topics {
            let _ = writeln!(out, "<h2>{}</h2>", escape_html(&section.topic.to_uppercase()));

            if section.items.is_empty() {
                let _ = writeln!(out, "<p class=\"empty\">{}</p>", escape_html(&empty_note(section)));
                continue;
            }

            for (i, item) in section.items.iter().enumerate() {
                let url = escape_html(&item.article.url);
                let _ = writeln!(out, "<div class=\"article\">");
                let _ = writeln!(
                    out,
                    "<p><strong>{}. <a href=\"{}\">{}</a></strong></p>",
                    i + 1,
                    url,
                    escape_html(&item.article.title)
                );
                let _ = writeln!(out, "<p>{}</p>", escape_html(&item.summary));
                let _ = writeln!(out, "<p><a href=\"{}\">{}</a></p>", url, url);
                let _ = writeln!(out, "</div>");
            }
        }

        let _ = writeln!(
            out,
            "<p class=\"footer\">Total articles: {}</p>",
            brief.article_count()
        );
        out.push_str("</body>\n</html>\n");
        out
    }
}

fn write_plain_items(out: &mut String, section: &TopicSection, link_prefix: &str) {
    if section.items.is_empty() {
        let _ = writeln!(out, "{}", empty_note(section));
        let _ = writeln!(out);
        return;
    }

    for (i, item) in section.items.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, item.article.title);
        let _ = writeln!(out, "   {}", item.summary);
        let _ = writeln!(out, "{}{}", link_prefix, item.article.url);
        let _ = writeln!(out);
    }
}

fn empty_note(section: &TopicSection) -> String {
    match &section.fetch_error {
        Some(cause) => format!("No articles (fetch failed: {})", cause),
        None => "No articles found.".to_string(),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brief::BriefItem;
    use crate::search::Article;
    use chrono::{Local, TimeZone};

    fn sample() -> Brief {
        Brief {
            generated_at: Local.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap(),
            topics: vec![
                TopicSection {
                    topic: "ai".into(),
                    items: vec![BriefItem {
                        article: Article::new("Models & <Agents>", "https://a.example/1?x=1&y=2", "..."),
                        summary: "Agents are \"busy\".".into(),
                    }],
                    fetch_error: None,
                },
                TopicSection {
                    topic: "space".into(),
                    items: Vec::new(),
                    fetch_error: Some("search API error 401".into()),
                },
            ],
        }
    }

    #[test]
    fn console_lists_topics_articles_and_total() {
        let out = Presenter::new("%B %d, %Y").console(&sample());
        assert!(out.contains("Date: October 19, 2026"));
        assert!(out.contains("\nAI\n"));
        assert!(out.contains("1. Models & <Agents>"));
        assert!(out.contains("Link: https://a.example/1?x=1&y=2"));
        assert!(out.contains("SPACE"));
        assert!(out.contains("No articles (fetch failed: search API error 401)"));
        assert!(out.ends_with("Total articles: 1\n"));
    }

    #[test]
    fn archive_layout() {
        let out = Presenter::new("%B %d, %Y").archive(&sample());
        assert!(out.starts_with("Daily News Brief - October 19, 2026\n"));
        assert!(out.contains(&"-".repeat(80)));
        assert!(out.contains("   Agents are \"busy\".\n   https://a.example/1?x=1&y=2\n"));
        assert!(out.contains("Total articles: 1"));
    }

    #[test]
    fn email_escapes_and_sets_subject() {
        let body = Presenter::new("%Y-%m-%d").email(&sample());
        assert_eq!(body.subject, "News Brief \u{2013} 2026-10-19");
        assert!(body.html.contains("Models &amp; &lt;Agents&gt;"));
        assert!(body.html.contains("href=\"https://a.example/1?x=1&amp;y=2\""));
        assert!(body.html.contains("Agents are &quot;busy&quot;."));
        assert!(body.html.contains("Total articles: 1"));
        assert_eq!(body.text, Presenter::new("%Y-%m-%d").archive(&sample()));
    }

    #[test]
    fn rendering_is_deterministic() {
        let presenter = Presenter::new("%B %d, %Y");
        let brief = sample();
        assert_eq!(presenter.console(&brief), presenter.console(&brief));
        assert_eq!(presenter.archive(&brief), presenter.archive(&brief));
        assert_eq!(presenter.email(&brief), presenter.email(&brief));
    }
}
