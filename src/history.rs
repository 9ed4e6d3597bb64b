use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::session::SessionSummary;
use crate::timing::Frequency;
use crate::util;
use crate::words::Difficulty;
use chrono::{DateTime, Local, SecondsFormat};
use itertools::Itertools;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS practice_sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    beat_id TEXT NOT NULL,
    beat_title TEXT NOT NULL,
    bpm REAL NOT NULL,
    frequency INTEGER NOT NULL,
    difficulty INTEGER NOT NULL,
    duration_secs REAL NOT NULL,
    prompt_count INTEGER NOT NULL,
    words TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_practice_sessions_recorded_at ON practice_sessions(recorded_at);
CREATE INDEX IF NOT EXISTS idx_practice_sessions_beat ON practice_sessions(beat_id);
"#;

const COLUMNS: &str =
    "id, beat_id, beat_title, bpm, frequency, difficulty, duration_secs, prompt_count, words, recorded_at";

/// One finished practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeRecord {
    pub id: Option<i64>,
    pub beat_id: String,
    pub beat_title: String,
    pub bpm: f64,
    pub frequency: Frequency,
    pub difficulty: Difficulty,
    pub duration_secs: f64,
    pub prompt_count: u32,
    pub words: Vec<String>,
    pub recorded_at: DateTime<Local>,
}

impl PracticeRecord {
    pub fn from_summary(
        summary: &SessionSummary,
        beat_id: &str,
        beat_title: &str,
        bpm: f64,
        frequency: Frequency,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id: None,
            beat_id: beat_id.to_string(),
            beat_title: beat_title.to_string(),
            bpm,
            frequency,
            difficulty,
            duration_secs: summary.duration_secs,
            prompt_count: summary.prompt_count,
            words: summary.words.clone(),
            recorded_at: Local::now(),
        }
    }

    /// "3 minutes ago" style age relative to `now`.
    pub fn age(&self, now: DateTime<Local>) -> String {
        let secs = (now - self.recorded_at).num_seconds().max(0) as u64;
        util::relative_time(secs)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let frequency: u32 = row.get(4)?;
        let difficulty: u8 = row.get(5)?;
        let words: String = row.get(8)?;
        let recorded_at: String = row.get(9)?;
        let invalid = |idx: usize, name: &str| {
            rusqlite::Error::InvalidColumnType(idx, name.to_string(), rusqlite::types::Type::Text)
        };

        Ok(Self {
            id: Some(row.get(0)?),
            beat_id: row.get(1)?,
            beat_title: row.get(2)?,
            bpm: row.get(3)?,
            frequency: Frequency::try_from(frequency).map_err(|_| invalid(4, "frequency"))?,
            difficulty: Difficulty::try_from(difficulty).map_err(|_| invalid(5, "difficulty"))?,
            duration_secs: row.get(6)?,
            prompt_count: row.get(7)?,
            words: serde_json::from_str(&words).map_err(|_| invalid(8, "words"))?,
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
                .map_err(|_| invalid(9, "recorded_at"))?
                .with_timezone(&Local),
        })
    }
}

/// Aggregates over the stored sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total_sessions: usize,
    pub total_duration_secs: f64,
    pub average_duration_secs: f64,
    pub longest_secs: f64,
    pub shortest_secs: f64,
    pub total_prompts: u64,
    pub by_difficulty: Vec<(Difficulty, usize)>,
}

impl HistoryStats {
    pub fn from_records(records: &[PracticeRecord]) -> Self {
        let durations: Vec<f64> = records.iter().map(|r| r.duration_secs).collect();
        let counts = records.iter().map(|r| r.difficulty).counts();
        let (shortest, longest) = match durations.iter().copied().minmax() {
            itertools::MinMaxResult::NoElements => (0.0, 0.0),
            itertools::MinMaxResult::OneElement(d) => (d, d),
            itertools::MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };

        Self {
            total_sessions: records.len(),
            total_duration_secs: durations.iter().sum(),
            average_duration_secs: util::mean(&durations).unwrap_or(0.0),
            longest_secs: longest,
            shortest_secs: shortest,
            total_prompts: records.iter().map(|r| r.prompt_count as u64).sum(),
            by_difficulty: Difficulty::ALL
                .iter()
                .map(|d| (*d, counts.get(d).copied().unwrap_or(0)))
                .collect(),
        }
    }
}

/// Orderings for history listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Longest,
    MostPrompts,
}

impl SortOrder {
    fn clause(self) -> &'static str {
        match self {
            SortOrder::Newest => "recorded_at DESC, id DESC",
            SortOrder::Oldest => "recorded_at ASC, id ASC",
            SortOrder::Longest => "duration_secs DESC, id DESC",
            SortOrder::MostPrompts => "prompt_count DESC, id DESC",
        }
    }
}

/// SQLite store of finished practice sessions.
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Opens the database under the user's state directory, creating it if needed.
    pub fn new() -> Result<Self> {
        let path = Self::database_path().unwrap_or_else(|| PathBuf::from("flowforge_history.db"));
        Self::with_path(path)
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn database_path() -> Option<PathBuf> {
        AppDirs::db_path()
    }

    /// Stores a session and returns its row id.
    pub fn record(&self, record: &PracticeRecord) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO practice_sessions
            (beat_id, beat_title, bpm, frequency, difficulty, duration_secs, prompt_count, words, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.beat_id,
                record.beat_title,
                record.bpm,
                record.frequency.bars(),
                record.difficulty.level(),
                record.duration_secs,
                record.prompt_count,
                serde_json::to_string(&record.words)?,
                record.recorded_at.to_rfc3339_opts(SecondsFormat::Micros, false),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        log::debug!("recorded practice session {id} on {}", record.beat_id);
        Ok(id)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<PracticeRecord>> {
        self.query(
            &format!("SELECT {COLUMNS} FROM practice_sessions ORDER BY {} LIMIT ?1", SortOrder::Newest.clause()),
            params![limit as i64],
        )
    }

    pub fn all(&self, order: SortOrder) -> Result<Vec<PracticeRecord>> {
        self.query(
            &format!("SELECT {COLUMNS} FROM practice_sessions ORDER BY {}", order.clause()),
            [],
        )
    }

    /// Case-insensitive match against the beat title or any prompted word.
    /// `%` and `_` in the query match literally.
    pub fn search(&self, query: &str) -> Result<Vec<PracticeRecord>> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        self.query(
            &format!(
                "SELECT {COLUMNS} FROM practice_sessions \
                 WHERE beat_title LIKE ?1 ESCAPE '\\' OR words LIKE ?1 ESCAPE '\\' ORDER BY {}",
                SortOrder::Newest.clause()
            ),
            params![pattern],
        )
    }

    pub fn by_difficulty(&self, difficulty: Difficulty) -> Result<Vec<PracticeRecord>> {
        self.query(
            &format!(
                "SELECT {COLUMNS} FROM practice_sessions WHERE difficulty = ?1 ORDER BY {}",
                SortOrder::Newest.clause()
            ),
            params![difficulty.level()],
        )
    }

    pub fn by_beat(&self, beat_id: &str) -> Result<Vec<PracticeRecord>> {
        self.query(
            &format!(
                "SELECT {COLUMNS} FROM practice_sessions WHERE beat_id = ?1 ORDER BY {}",
                SortOrder::Newest.clause()
            ),
            params![beat_id],
        )
    }

    pub fn stats(&self) -> Result<HistoryStats> {
        Ok(HistoryStats::from_records(&self.all(SortOrder::Newest)?))
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM practice_sessions WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM practice_sessions", [])?;
        Ok(())
    }

    /// Deletes all but the newest `keep` sessions. Returns how many went.
    pub fn prune(&self, keep: usize) -> Result<usize> {
        let n = self.conn.execute(
            &format!(
                "DELETE FROM practice_sessions WHERE id NOT IN \
                 (SELECT id FROM practice_sessions ORDER BY {} LIMIT ?1)",
                SortOrder::Newest.clause()
            ),
            params![keep as i64],
        )?;
        Ok(n)
    }

    /// All sessions, newest first, as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.all(SortOrder::Newest)?)?)
    }

    fn query<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<PracticeRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, PracticeRecord::from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tempfile::tempdir;

    fn record(beat: &str, difficulty: Difficulty, secs: f64, words: &[&str]) -> PracticeRecord {
        PracticeRecord {
            id: None,
            beat_id: beat.to_string(),
            beat_title: beat.replace('-', " "),
            bpm: 90.0,
            frequency: Frequency::Eight,
            difficulty,
            duration_secs: secs,
            prompt_count: words.len() as u32,
            words: words.iter().map(|w| w.to_string()).collect(),
            recorded_at: Local::now(),
        }
    }

    #[test]
    fn record_and_read_back() {
        let db = HistoryDb::open_in_memory().unwrap();
        let rec = record("battle-yo", Difficulty::Hard, 64.0, &["fire", "desire", "entire"]);
        let id = db.record(&rec).unwrap();

        let rows = db.recent(10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, Some(id));
        assert_eq!(rows[0].words, rec.words);
        assert_eq!(rows[0].difficulty, Difficulty::Hard);
        assert_eq!(rows[0].frequency, Frequency::Eight);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let db = HistoryDb::open_in_memory().unwrap();
        let now = Local::now();
        for i in 0..5 {
            let mut rec = record("battle-yo", Difficulty::Easy, 10.0 * i as f64, &[]);
            rec.recorded_at = now - ChronoDuration::minutes(10 - i);
            db.record(&rec).unwrap();
        }
        let rows = db.recent(3).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].duration_secs, 40.0);
        assert_eq!(rows[2].duration_secs, 20.0);
    }

    #[test]
    fn search_matches_title_and_words() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&record("ambient-dreams", Difficulty::Easy, 30.0, &["flow"]))
            .unwrap();
        db.record(&record("battle-yo", Difficulty::Medium, 30.0, &["rhythm"]))
            .unwrap();

        assert_eq!(db.search("AMBIENT").unwrap().len(), 1);
        assert_eq!(db.search("rhythm").unwrap()[0].beat_id, "battle-yo");
        assert!(db.search("nothing-like-this").unwrap().is_empty());
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&record("battle-yo", Difficulty::Easy, 30.0, &["flow"]))
            .unwrap();
        db.record(&record("boom-bap", Difficulty::Easy, 30.0, &["fire", "rhyme"]))
            .unwrap();

        assert!(db.search("%").unwrap().is_empty());
        assert!(db.search("_").unwrap().is_empty());
        assert!(db.search("f_re").unwrap().is_empty());
        assert!(db.search("\\").unwrap().is_empty());

        db.record(&record("lo-fi", Difficulty::Easy, 30.0, &["100%_real"]))
            .unwrap();
        assert_eq!(db.search("%_").unwrap()[0].beat_id, "lo-fi");
    }

    #[test]
    fn filters_by_difficulty_and_beat() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&record("a", Difficulty::Easy, 1.0, &[])).unwrap();
        db.record(&record("a", Difficulty::Hard, 2.0, &[])).unwrap();
        db.record(&record("b", Difficulty::Hard, 3.0, &[])).unwrap();

        assert_eq!(db.by_difficulty(Difficulty::Hard).unwrap().len(), 2);
        assert_eq!(db.by_difficulty(Difficulty::Medium).unwrap().len(), 0);
        assert_eq!(db.by_beat("a").unwrap().len(), 2);
    }

    #[test]
    fn stats_over_sessions() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&record("a", Difficulty::Easy, 30.0, &["x"])).unwrap();
        db.record(&record("a", Difficulty::Easy, 90.0, &["x", "y"]))
            .unwrap();
        db.record(&record("b", Difficulty::Hard, 60.0, &[])).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.total_duration_secs, 180.0);
        assert_eq!(stats.average_duration_secs, 60.0);
        assert_eq!(stats.longest_secs, 90.0);
        assert_eq!(stats.shortest_secs, 30.0);
        assert_eq!(stats.total_prompts, 3);
        assert_eq!(
            stats.by_difficulty,
            vec![
                (Difficulty::Easy, 2),
                (Difficulty::Medium, 0),
                (Difficulty::Hard, 1)
            ]
        );
    }

    #[test]
    fn stats_on_empty_history() {
        let stats = HistoryStats::from_records(&[]);
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.average_duration_secs, 0.0);
        assert_eq!(stats.longest_secs, 0.0);
    }

    #[test]
    fn sort_orders() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&record("a", Difficulty::Easy, 10.0, &["1", "2", "3"]))
            .unwrap();
        db.record(&record("b", Difficulty::Easy, 50.0, &["1"])).unwrap();

        assert_eq!(db.all(SortOrder::Longest).unwrap()[0].beat_id, "b");
        assert_eq!(db.all(SortOrder::MostPrompts).unwrap()[0].beat_id, "a");
    }

    #[test]
    fn delete_and_clear() {
        let db = HistoryDb::open_in_memory().unwrap();
        let id = db.record(&record("a", Difficulty::Easy, 1.0, &[])).unwrap();
        db.record(&record("b", Difficulty::Easy, 1.0, &[])).unwrap();

        assert!(db.delete(id).unwrap());
        assert!(!db.delete(id).unwrap());
        assert_eq!(db.all(SortOrder::Newest).unwrap().len(), 1);

        db.clear_all().unwrap();
        assert!(db.all(SortOrder::Newest).unwrap().is_empty());
    }

    #[test]
    fn prune_keeps_newest() {
        let db = HistoryDb::open_in_memory().unwrap();
        let now = Local::now();
        for i in 0..5 {
            let mut rec = record("battle-yo", Difficulty::Easy, i as f64, &[]);
            rec.recorded_at = now - ChronoDuration::minutes(10 - i);
            db.record(&rec).unwrap();
        }

        assert_eq!(db.prune(2).unwrap(), 3);
        let rows = db.all(SortOrder::Newest).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].duration_secs, 4.0);
        assert_eq!(rows[1].duration_secs, 3.0);

        assert_eq!(db.prune(10).unwrap(), 0);
        assert_eq!(db.prune(0).unwrap(), 2);
        assert!(db.all(SortOrder::Newest).unwrap().is_empty());
    }

    #[test]
    fn export_is_json_array() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&record("a", Difficulty::Medium, 12.5, &["word"]))
            .unwrap();
        let json = db.export_json().unwrap();
        let parsed: Vec<PracticeRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].words, vec!["word".to_string()]);
        assert_eq!(parsed[0].difficulty, Difficulty::Medium);
    }

    #[test]
    fn persists_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("history.db");
        {
            let db = HistoryDb::with_path(&path).unwrap();
            db.record(&record("a", Difficulty::Easy, 5.0, &[])).unwrap();
        }
        let db = HistoryDb::with_path(&path).unwrap();
        assert_eq!(db.recent(5).unwrap().len(), 1);
    }

    #[test]
    fn from_summary_copies_session_data() {
        let summary = SessionSummary {
            duration_secs: 42.0,
            prompt_count: 2,
            words: vec!["fire".into(), "flow".into()],
        };
        let rec = PracticeRecord::from_summary(
            &summary,
            "battle-yo",
            "Battle Yo",
            90.0,
            Frequency::Four,
            Difficulty::Easy,
        );
        assert_eq!(rec.prompt_count, 2);
        assert_eq!(rec.words, summary.words);
        assert!(rec.age(rec.recorded_at + ChronoDuration::minutes(3)).contains("minute"));
    }
}
