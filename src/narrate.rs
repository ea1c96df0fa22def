//! Narration scripts: speech-ready text files built from rewritten posts.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::app::Result;
use crate::rewrite::{ERROR_PREFIX, INSUFFICIENT_CONTENT, REJECTED_OUTPUT};
use crate::store::Store;

/// Cleaned text shorter than this is not worth narrating.
pub const MIN_SCRIPT_CHARS: usize = 10;

const MAX_FILENAME_CHARS: usize = 50;

/// Jamo runs a speech engine would spell out letter by letter.
static SPOKEN_FORMS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("ㅋ+", "크크"),
        ("ㅠ+", "유유"),
        ("ㅎ+", "하하"),
        ("ㅜ+", "우우"),
        ("ㅇ+", "응응"),
    ]
    .into_iter()
    .filter_map(|(pattern, spoken)| Regex::new(pattern).ok().map(|re| (re, spoken)))
    .collect()
});

fn is_single_jamo(token: &str) -> bool {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => matches!(c, 'ㄱ'..='ㅎ' | 'ㅏ'..='ㅣ'),
        _ => false,
    }
}

/// Make generated text readable aloud.
pub fn preprocess_text(text: &str) -> String {
    let mut spoken = text.to_string();
    for (re, replacement) in SPOKEN_FORMS.iter() {
        spoken = re.replace_all(&spoken, *replacement).into_owned();
    }

    spoken
        .split_whitespace()
        .filter(|token| !is_single_jamo(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title as a file name fragment.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .map(|c| if c == ' ' { '_' } else { c })
        .take(MAX_FILENAME_CHARS)
        .collect()
}

fn is_placeholder(text: &str) -> bool {
    text == INSUFFICIENT_CONTENT || text == REJECTED_OUTPUT || text.starts_with(ERROR_PREFIX)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NarrationReport {
    pub written: Vec<PathBuf>,
    pub skipped: usize,
}

/// Write one `NNN_<title>.txt` script per usable row of `source` into `dir`.
///
/// Numbering is the zero-based row position, so a skipped row leaves a gap.
pub fn write_scripts<S: Store + ?Sized>(source: &S, dir: &Path) -> Result<NarrationReport> {
    let table = source.load()?;
    let mut report = NarrationReport::default();

    if table.is_empty() {
        info!("No rewritten posts to narrate");
        return Ok(report);
    }

    fs::create_dir_all(dir)?;

    for row in 0..table.len() {
        let generated = table.get(row, "generated_text").unwrap_or("").trim();
        if is_placeholder(generated) {
            debug!("Row {} has no usable narration", row);
            report.skipped += 1;
            continue;
        }

        let script = preprocess_text(generated);
        if script.chars().count() < MIN_SCRIPT_CHARS {
            debug!("Row {} is too short after cleanup", row);
            report.skipped += 1;
            continue;
        }

        let title = sanitize_filename(table.get(row, "title").unwrap_or(""));
        let path = dir.join(format!("{:03}_{}.txt", row, title));
        fs::write(&path, script)?;
        report.written.push(path);
    }

    info!(
        "Wrote {} narration scripts to {} ({} skipped)",
        report.written.len(),
        dir.display(),
        report.skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CsvStore, Table};
    use tempfile::TempDir;

    #[test]
    fn test_preprocess_replaces_jamo_runs() {
        assert_eq!(preprocess_text("웃기네 ㅋㅋㅋㅋ 진짜"), "웃기네 크크 진짜");
        assert_eq!(preprocess_text("슬프다ㅠㅠ"), "슬프다유유");
        assert_eq!(preprocess_text("ㅎㅎ 그래"), "하하 그래");
    }

    #[test]
    fn test_preprocess_drops_lone_jamo_and_collapses_spaces() {
        assert_eq!(preprocess_text("그래서  ㄷ   갔다\n\nㅏ 끝"), "그래서 갔다 끝");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a/b: c?"), "ab_c");
        assert_eq!(sanitize_filename(&"가".repeat(80)).chars().count(), 50);
    }

    #[test]
    fn test_write_scripts() {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::new(dir.path().join("processed.csv"));
        let mut table = Table::new(["title", "generated_text"]);
        table.push_row(vec!["첫 글".into(), "오늘 회사에서 있었던 일이야 ㅋㅋ".into()]);
        table.push_row(vec!["짧음".into(), INSUFFICIENT_CONTENT.into()]);
        table.push_row(vec!["오류".into(), "error: HTTP 500".into()]);
        table.push_row(vec!["자모".into(), "ㅋ ㄱ ㅏ".into()]);
        store.save(&table).unwrap();

        let out = dir.path().join("narration");
        let report = write_scripts(&store, &out).unwrap();

        assert_eq!(report.written, vec![out.join("000_첫_글.txt")]);
        assert_eq!(report.skipped, 3);
        let text = fs::read_to_string(out.join("000_첫_글.txt")).unwrap();
        assert_eq!(text, "오늘 회사에서 있었던 일이야 크크");
    }

    #[test]
    fn test_write_scripts_empty_source() {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::new(dir.path().join("missing.csv"));
        let out = dir.path().join("narration");
        let report = write_scripts(&store, &out).unwrap();
        assert!(report.written.is_empty());
        assert!(!out.exists());
    }
}
