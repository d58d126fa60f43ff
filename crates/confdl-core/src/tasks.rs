//! Download task derivation: one session becomes a video and/or a slide task.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::SessionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    Video,
    Slide,
}

impl AssetType {
    /// File extension of the downloaded asset.
    pub fn extension(self) -> &'static str {
        match self {
            AssetType::Video => "mp4",
            AssetType::Slide => "pptx",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssetType::Video => "video",
            AssetType::Slide => "slides",
        })
    }
}

/// Which assets a run downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetRestriction {
    VideoOnly,
    SlidesOnly,
    #[default]
    Both,
}

impl AssetRestriction {
    pub fn allows(self, asset: AssetType) -> bool {
        matches!(
            (self, asset),
            (AssetRestriction::Both, _)
                | (AssetRestriction::VideoOnly, AssetType::Video)
                | (AssetRestriction::SlidesOnly, AssetType::Slide)
        )
    }
}

/// One asset to fetch. An empty `source_url` means there is nothing to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub session_id: String,
    pub asset_type: AssetType,
    pub source_url: String,
    pub destination: PathBuf,
}

/// Tasks of one session, scheduled together on one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUnit {
    pub session_id: String,
    pub tasks: Vec<DownloadTask>,
}

/// Supplies identifiers for sessions without a session code.
pub trait IdentifierSource {
    fn placeholder(&mut self) -> String;
}

/// `UKN1000`..`UKN1999` drawn from a seedable RNG.
#[derive(Debug, Clone)]
pub struct PlaceholderIds {
    rng: StdRng,
}

impl PlaceholderIds {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl IdentifierSource for PlaceholderIds {
    fn placeholder(&mut self) -> String {
        format!("UKN{}", self.rng.gen_range(1000..2000))
    }
}

/// Session code made safe as a file stem. Returns `None` when nothing usable is left.
pub fn sanitize_stem(code: &str) -> Option<String> {
    let cleaned: String = code
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_end_matches(['.', ' ']);
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Identifier used as the file stem for both of a session's assets.
pub fn session_identifier(session: &SessionRecord, ids: &mut dyn IdentifierSource) -> String {
    sanitize_stem(&session.session_code).unwrap_or_else(|| ids.placeholder())
}

/// Build the video and slide tasks for `session`, then keep those `restriction` allows.
pub fn derive_tasks(
    session: &SessionRecord,
    restriction: AssetRestriction,
    dest_dir: &Path,
    ids: &mut dyn IdentifierSource,
) -> Vec<DownloadTask> {
    let session_id = session_identifier(session, ids);
    let candidates = [
        (AssetType::Video, session.download_video_link.as_deref()),
        (AssetType::Slide, session.slide_deck.as_deref()),
    ];
    candidates
        .into_iter()
        .map(|(asset_type, url)| DownloadTask {
            session_id: session_id.clone(),
            asset_type,
            source_url: url.unwrap_or_default().to_string(),
            destination: dest_dir.join(format!("{}.{}", session_id, asset_type.extension())),
        })
        .filter(|task| restriction.allows(task.asset_type))
        .collect()
}

/// Derive one unit per matched session, keeping match order (duplicates included).
///
/// Placeholder draws can repeat; a repeated one is logged because the two
/// sessions then write to the same files.
pub fn derive_units(
    sessions: &[&SessionRecord],
    restriction: AssetRestriction,
    dest_dir: &Path,
    ids: &mut dyn IdentifierSource,
) -> Vec<SessionUnit> {
    let mut placeholders = HashSet::new();
    sessions
        .iter()
        .map(|session| {
            let tasks = derive_tasks(session, restriction, dest_dir, &mut *ids);
            let session_id = tasks
                .first()
                .map(|t| t.session_id.clone())
                .unwrap_or_default();
            if is_repeated_placeholder(&mut placeholders, session, &session_id) {
                tracing::warn!(
                    session = %session_id,
                    title = %session.title,
                    "placeholder id drawn twice, sessions share destination files"
                );
            }
            SessionUnit { session_id, tasks }
        })
        .filter(|unit| !unit.tasks.is_empty())
        .collect()
}

/// True when `session` has no usable code and `session_id` was already handed out
/// as a placeholder in this run.
fn is_repeated_placeholder(
    seen: &mut HashSet<String>,
    session: &SessionRecord,
    session_id: &str,
) -> bool {
    if session_id.is_empty() || sanitize_stem(&session.session_code).is_some() {
        return false;
    }
    !seen.insert(session_id.to_string())
}
