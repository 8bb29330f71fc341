use std::sync::LazyLock;

use regex::Regex;

static ANNOTATIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\s*\([^)]*\)", r"\s*\[[^\]]*\]", r"\s*\{[^}]*\}"]
        .into_iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

/// Human readable form of a raw upload title.
///
/// Drops a leading `"{artist} - "`, `"{artist}: "` or `"{artist} – "` prefix, then any
/// `(...)`, `[...]` and `{...}` annotations, then collapses whitespace. The artist match
/// is case-insensitive, which also covers title-cased and lower-cased spellings.
pub fn clean_title(title: &str, artist: &str) -> String {
    let mut cleaned = title.to_string();

    let artist = artist.trim();
    if !artist.is_empty() {
        let prefix = format!(r"(?i)^{}\s*[-:–]\s*", regex::escape(artist));
        if let Ok(re) = Regex::new(&prefix) {
            cleaned = re.replace(&cleaned, "").into_owned();
        }
    }

    for re in ANNOTATIONS.iter() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `m:ss`, or `Unknown` when the length is not known.
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "Unknown".to_string();
    }
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_artist_prefix() {
        assert_eq!(
            clean_title("Daft Punk - Get Lucky", "Daft Punk"),
            "Get Lucky"
        );
        assert_eq!(clean_title("daft punk: Get Lucky", "Daft Punk"), "Get Lucky");
        assert_eq!(clean_title("DAFT PUNK – Get Lucky", "daft punk"), "Get Lucky");
    }

    #[test]
    fn test_prefix_only_at_start() {
        assert_eq!(
            clean_title("Get Lucky - Daft Punk", "Daft Punk"),
            "Get Lucky - Daft Punk"
        );
    }

    #[test]
    fn test_strips_annotations_and_whitespace() {
        assert_eq!(
            clean_title(
                "Rick Astley - Never Gonna Give You Up (Official Video) [4K]  {Remastered}",
                "Rick Astley"
            ),
            "Never Gonna Give You Up"
        );
        assert_eq!(clean_title("  Song   (live)   Name ", ""), "Song Name");
    }

    #[test]
    fn test_artist_with_regex_metacharacters() {
        assert_eq!(clean_title("AC/DC (+) - T.N.T.", "AC/DC (+)"), "T.N.T.");
    }

    #[test]
    fn test_empty_title() {
        assert_eq!(clean_title("", "Anyone"), "");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "Unknown");
        assert_eq!(format_duration(5), "0:05");
        assert_eq!(format_duration(212), "3:32");
        assert_eq!(format_duration(3600), "60:00");
    }
}
