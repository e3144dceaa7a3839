use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use super::{AppError, DownloadRequest, ValidationError};

pub const DEFAULT_PLATFORM: &str = "spotify";

/// A supported source service: how its URLs look and how it is presented.
#[derive(Debug)]
pub struct PlatformDescriptor {
    pub id: &'static str,
    pub display_name: &'static str,
    pub placeholder: &'static str,
    url_pattern: Regex,
}

impl PlatformDescriptor {
    fn new(
        id: &'static str,
        display_name: &'static str,
        placeholder: &'static str,
        pattern: &str,
    ) -> Self {
        Self {
            id,
            display_name,
            placeholder,
            url_pattern: Regex::new(pattern).unwrap(),
        }
    }

    /// Unanchored search: the pattern may match anywhere in the URL.
    pub fn matches(&self, url: &str) -> bool {
        self.url_pattern.is_match(url)
    }
}

impl PartialEq for PlatformDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name)
    }
}

pub struct PlatformRegistry {
    platforms: Vec<PlatformDescriptor>,
}

lazy_static! {
    static ref BUILTIN: PlatformRegistry = PlatformRegistry {
        platforms: vec![
            PlatformDescriptor::new(
                "spotify",
                "Spotify",
                "https://open.spotify.com/track/...",
                r"spotify\.com/(track|album|playlist)",
            ),
            PlatformDescriptor::new(
                "youtube-audio",
                "YouTube Audio",
                "https://www.youtube.com/watch?v=...",
                r"youtube\.com/watch|youtu\.be/",
            ),
            PlatformDescriptor::new(
                "youtube-video",
                "YouTube Video",
                "https://www.youtube.com/watch?v=...",
                r"youtube\.com/watch|youtu\.be/",
            ),
            PlatformDescriptor::new(
                "tiktok",
                "TikTok",
                "https://www.tiktok.com/@user/video/...",
                r"tiktok\.com",
            ),
            PlatformDescriptor::new(
                "twitter",
                "Twitter/X",
                "https://twitter.com/user/status/...",
                r"twitter\.com|x\.com",
            ),
            PlatformDescriptor::new(
                "pinterest",
                "Pinterest",
                "https://pin.it/...",
                r"pinterest\.com/pin/|pin\.it/",
            ),
            PlatformDescriptor::new(
                "facebook",
                "Facebook",
                "https://www.facebook.com/reel/... or watch?v=...",
                r"facebook\.com/(watch|share|reel|.*/videos)",
            ),
            PlatformDescriptor::new(
                "instagram",
                "Instagram",
                "https://www.instagram.com/p/... or /reel/...",
                r"instagram\.com/(p|reel|tv)/",
            ),
        ],
    };
}

impl PlatformRegistry {
    /// The fixed set of platforms the service knows how to fetch from.
    pub fn builtin() -> &'static PlatformRegistry {
        &BUILTIN
    }

    pub fn get(&self, id: &str) -> Option<&PlatformDescriptor> {
        self.platforms.iter().find(|p| p.id == id)
    }

    pub fn lookup(&self, id: &str) -> Result<&PlatformDescriptor, AppError> {
        self.get(id)
            .ok_or_else(|| AppError::UnknownPlatform(id.to_string()))
    }

    /// The platform selected when the application starts.
    pub fn default_platform(&self) -> &PlatformDescriptor {
        self.get(DEFAULT_PLATFORM).unwrap_or(&self.platforms[0])
    }

    pub fn all(&self) -> impl Iterator<Item = &PlatformDescriptor> {
        self.platforms.iter()
    }

    /// Reports whether `url` has the shape the platform accepts.
    pub fn validate(&self, url: &str, platform_id: &str) -> Result<bool, AppError> {
        Ok(self.lookup(platform_id)?.matches(url))
    }

    /// Gate in front of submission: trims the input and turns a rejection
    /// into the message the user sees.
    pub fn validate_request(
        &self,
        url: &str,
        platform_id: &str,
    ) -> Result<DownloadRequest, AppError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl.into());
        }
        if !self.validate(url, platform_id)? {
            return Err(ValidationError::PatternMismatch.into());
        }
        Ok(DownloadRequest {
            url: url.to_string(),
            platform_id: platform_id.to_string(),
        })
    }
}
