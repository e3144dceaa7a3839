/// Known status milestones and the percentage shown for each.
///
/// The values are a UX signal only. The service reports discrete textual
/// milestones, not real completion.
const MILESTONES: &[(&str, u8)] = &[
    ("starting", 10),
    ("Fetching track info...", 20),
    ("Downloading audio (320k MP3)...", 60),
    ("Downloading album cover...", 80),
    ("Downloading audio...", 70),
    ("Downloading video...", 70),
    ("Downloading video (720p max)...", 70),
    ("Downloading Facebook video...", 70),
    ("Extracting Facebook video URL...", 30),
];

const FOUND_MARKER: &str = "Found:";
const FOUND_PERCENT: u8 = 40;
const UNKNOWN_PERCENT: u8 = 50;

/// Maps a free-text status to a percentage. Longest matching milestone wins,
/// earlier table entries win ties.
pub fn estimate(status_text: &str) -> u8 {
    let mut best: Option<(&str, u8)> = None;
    for &(needle, percent) in MILESTONES {
        if !status_text.contains(needle) {
            continue;
        }
        match best {
            Some((current, _)) if current.len() >= needle.len() => {}
            _ => best = Some((needle, percent)),
        }
    }

    match best {
        Some((_, percent)) => percent,
        None if status_text.contains(FOUND_MARKER) => FOUND_PERCENT,
        None => UNKNOWN_PERCENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_milestones() {
        assert_eq!(estimate("starting"), 10);
        assert_eq!(estimate("Fetching track info..."), 20);
        assert_eq!(estimate("Downloading audio (320k MP3)..."), 60);
        assert_eq!(estimate("Downloading album cover..."), 80);
        assert_eq!(estimate("Downloading video (720p max)..."), 70);
        assert_eq!(estimate("Extracting Facebook video URL..."), 30);
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(estimate("Found: My Song"), 40);
        assert_eq!(estimate(""), 50);
        assert_eq!(estimate("Converting with ffmpeg"), 50);
    }

    #[test]
    fn test_milestone_beats_found_marker() {
        assert_eq!(estimate("Found: Artist - Fetching track info..."), 20);
    }

    #[test]
    fn test_longest_match_wins() {
        // Both "starting" and the longer cover milestone occur here.
        assert_eq!(estimate("starting Downloading album cover..."), 80);
    }

    #[test]
    fn test_always_in_range() {
        for text in ["", "x", "completed", "error", "Found:", "starting starting"] {
            assert!(estimate(text) <= 100);
        }
    }
}
