use crate::assets::embedded_file;
use crate::error::{Error, Result};
use crate::timing::{Bpm, TempoCategory};
use serde::{Deserialize, Serialize};

const BEATS_FILE: &str = "beats.json";

/// A backing beat the performer can practice over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatMetadata {
    pub id: String,
    pub title: String,
    pub bpm: f64,
    pub storage_url: String,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<u32>,
    #[serde(default)]
    pub artist_name: Option<String>,
}

impl BeatMetadata {
    pub fn tempo(&self) -> Result<Bpm> {
        Bpm::new(self.bpm)
    }

    pub fn category(&self) -> TempoCategory {
        TempoCategory::of(self.bpm)
    }
}

#[derive(Debug, Clone)]
pub struct BeatCatalog {
    beats: Vec<BeatMetadata>,
}

impl BeatCatalog {
    /// The beat list compiled into the binary. Beats with an unusable tempo are dropped.
    pub fn embedded() -> Result<Self> {
        Self::from_json(embedded_file(BEATS_FILE)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let beats: Vec<BeatMetadata> = serde_json::from_slice(bytes)?;
        let beats = beats
            .into_iter()
            .filter(|b| match b.tempo() {
                Ok(_) => true,
                Err(e) => {
                    log::warn!("dropping beat {}: {e}", b.id);
                    false
                }
            })
            .collect();
        Ok(Self { beats })
    }

    pub fn all(&self) -> &[BeatMetadata] {
        &self.beats
    }

    pub fn free(&self) -> impl Iterator<Item = &BeatMetadata> {
        self.beats.iter().filter(|b| !b.is_premium)
    }

    /// Looks a beat up by id, or by title ignoring case.
    pub fn find(&self, key: &str) -> Result<&BeatMetadata> {
        self.beats
            .iter()
            .find(|b| b.id == key)
            .or_else(|| self.beats.iter().find(|b| b.title.eq_ignore_ascii_case(key)))
            .ok_or_else(|| Error::UnknownBeat(key.to_string()))
    }

    pub fn first(&self) -> Option<&BeatMetadata> {
        self.free().next().or_else(|| self.beats.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn embedded_catalog_loads() {
        let catalog = BeatCatalog::embedded().unwrap();
        assert!(!catalog.all().is_empty());
        assert!(catalog.free().all(|b| !b.is_premium));
        assert!(catalog.all().iter().all(|b| b.bpm > 0.0));
    }

    #[test]
    fn lookup_by_id_or_title() {
        let catalog = BeatCatalog::embedded().unwrap();
        let by_id = catalog.find("battle-yo").unwrap();
        assert_eq!(by_id.bpm, 90.0);
        let by_title = catalog.find("BATTLE YO").unwrap();
        assert_eq!(by_title.id, by_id.id);
        assert_matches!(catalog.find("no-such-beat"), Err(Error::UnknownBeat(_)));
    }

    #[test]
    fn drops_beats_with_bad_tempo() {
        let json = br#"[
            {"id": "ok", "title": "Ok", "bpm": 90, "storage_url": "/beats/ok.mp3"},
            {"id": "bad", "title": "Bad", "bpm": 0, "storage_url": "/beats/bad.mp3", "is_premium": true}
        ]"#;
        let catalog = BeatCatalog::from_json(json).unwrap();
        assert_eq!(catalog.all().len(), 1);
        assert_eq!(catalog.first().unwrap().id, "ok");
    }

    #[test]
    fn category_follows_tempo() {
        let catalog = BeatCatalog::embedded().unwrap();
        assert_eq!(catalog.find("be-battle-be").unwrap().category(), TempoCategory::VeryFast);
        assert_eq!(catalog.find("ambient-dreams").unwrap().category(), TempoCategory::Slow);
    }
}
