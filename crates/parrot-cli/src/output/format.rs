use parrot_core::model::{BrainStats, CleanReport, GenerationResult, TransitionPage};
use parrot_registry::DatabaseStats;

use super::OutputFormat;

pub fn format_brain_list(brains: &[BrainStats], fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(brains).unwrap_or_default(),
        OutputFormat::Text => format_brain_list_text(brains),
    }
}

fn format_brain_list_text(brains: &[BrainStats]) -> String {
    if brains.is_empty() {
        return "No brains found.\n".to_string();
    }

    let width = brains.iter().map(|b| b.channel.len()).max().unwrap_or(0);
    let mut out = String::new();
    for b in brains {
        out.push_str(&format!(
            "\u{25c6} {:<width$}  {} transitions, {} pairs, {} messages  {}\n",
            b.channel,
            b.total_entries,
            b.unique_pairs,
            b.message_count,
            human_size(b.db_size),
        ));
    }
    out
}

pub fn format_transitions(channel: &str, page: &TransitionPage, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(page).unwrap_or_default(),
        OutputFormat::Text => format_transitions_text(channel, page),
    }
}

fn format_transitions_text(channel: &str, page: &TransitionPage) -> String {
    if page.transitions.is_empty() {
        return format!("No transitions found in #{channel}.\n");
    }

    let pages = page.total.div_ceil(u64::from(page.page_size.max(1)));
    let mut out = format!(
        "#{channel}: {} transition(s), page {}/{}\n",
        page.total, page.page, pages
    );
    for t in &page.transitions {
        out.push_str(&format!(
            "  {:>6}  {} {} -> {}\n",
            t.count, t.word1, t.word2, t.next_word
        ));
    }
    out
}

pub fn format_clean_reports(reports: &[CleanReport], fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(reports).unwrap_or_default(),
        OutputFormat::Text => format_clean_reports_text(reports),
    }
}

fn format_clean_reports_text(reports: &[CleanReport]) -> String {
    let removed: Vec<&CleanReport> = reports.iter().filter(|r| r.total_removed > 0).collect();
    if removed.is_empty() {
        return "Nothing to clean.\n".to_string();
    }

    let mut out = String::new();
    for r in removed {
        out.push_str(&format!("#{}: removed {} transition(s)\n", r.channel, r.total_removed));
        for w in &r.words {
            out.push_str(&format!("  {}: {}\n", w.word, w.removed));
        }
    }
    out
}

pub fn format_database_stats(stats: &DatabaseStats, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(stats).unwrap_or_default(),
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str("Parrot Statistics\n");
            out.push_str("=================\n");
            out.push_str(&format!("Channels:          {}\n", stats.unique_channels));
            out.push_str(&format!("Transitions:       {}\n", stats.total_transitions));
            out.push_str(&format!(
                "Storage:           {}\n",
                human_size(stats.total_size)
            ));
            out.push_str(&format!("Blacklisted words: {}\n", stats.blacklisted_words));
            out.push_str(&format!(
                "Data directory:    {}\n",
                stats.data_directory.display()
            ));
            out
        }
    }
}

/// One line per processed message in JSON; only what would be said in text.
pub fn format_generation(result: &GenerationResult, fmt: OutputFormat) -> Option<String> {
    match fmt {
        OutputFormat::Json => serde_json::to_string(result).ok(),
        OutputFormat::Text => result.response.clone(),
    }
}

/// Text summary of a triggered response, for the log stream.
pub fn describe_generation(result: &GenerationResult) -> String {
    let when = result
        .generated_at
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    match (&result.response, result.failure_reason) {
        (Some(text), _) => format!(
            "[{when}] responded after {} attempt(s){}: {text}",
            result.attempts,
            if result.using_global { " (global)" } else { "" }
        ),
        (None, Some(reason)) => format!(
            "[{when}] gave up after {} attempt(s): {reason}",
            result.attempts
        ),
        (None, None) => format!("[{when}] no response"),
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parrot_core::model::{CleanWordResult, Transition};

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_empty_listings() {
        assert_eq!(format_brain_list(&[], OutputFormat::Text), "No brains found.\n");
        assert_eq!(format_brain_list(&[], OutputFormat::Json), "[]");
        assert_eq!(
            format_clean_reports(&[CleanReport::empty("chan")], OutputFormat::Text),
            "Nothing to clean.\n"
        );
    }

    #[test]
    fn test_transitions_text() {
        let page = TransitionPage {
            transitions: vec![Transition::new("a", "b", "c", 3)],
            total: 51,
            page: 2,
            page_size: 50,
        };
        let text = format_transitions("chan", &page, OutputFormat::Text);
        assert!(text.starts_with("#chan: 51 transition(s), page 2/2\n"));
        assert!(text.contains("a b -> c"));
    }

    #[test]
    fn test_clean_reports_text() {
        let report = CleanReport {
            channel: "chan".to_string(),
            words: vec![CleanWordResult {
                word: "bad".to_string(),
                removed: 2,
            }],
            total_removed: 2,
        };
        let text = format_clean_reports(&[report], OutputFormat::Text);
        assert_eq!(text, "#chan: removed 2 transition(s)\n  bad: 2\n");
    }

    #[test]
    fn test_generation_text_is_response_only() {
        let silent = GenerationResult::default();
        assert_eq!(format_generation(&silent, OutputFormat::Text), None);

        let spoke = GenerationResult {
            triggered: true,
            success: true,
            response: Some("hello there".to_string()),
            attempts: 1,
            ..Default::default()
        };
        assert_eq!(
            format_generation(&spoke, OutputFormat::Text).as_deref(),
            Some("hello there")
        );
        assert!(describe_generation(&spoke).ends_with("1 attempt(s): hello there"));
    }
}
