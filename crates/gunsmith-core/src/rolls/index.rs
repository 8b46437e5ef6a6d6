use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Transaction};

use crate::error::{Error, Result};
use crate::hashes::{PlugCategory, SocketCategory, DUMMY_CATEGORY};
use crate::manifest::definitions::{InventoryItemDefinition, SocketsBlock};
use crate::manifest::ManifestDb;
use crate::model::WeaponArchetype;
use crate::rolls::RollColumn;

use super::migrations::{LATEST_VERSION, MIGRATIONS};

/// Held while an index is built, so only one build runs per process.
static BUILD_LOCK: Mutex<()> = Mutex::new(());

/// Distinguishes staging files of builds in the same process.
static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// A roll index database.
#[derive(Debug)]
pub struct RollIndex {
    conn: Connection,
    path: PathBuf,
}

impl RollIndex {
    /// Where the index for `manifest` lives: the manifest path plus `.weapons`.
    #[must_use]
    pub fn path_for(manifest: &Path) -> PathBuf {
        let mut path: OsString = manifest.as_os_str().to_owned();
        path.push(".weapons");
        PathBuf::from(path)
    }

    /// Open an existing, fully migrated index read-only.
    ///
    /// An index written by an older schema is reported as `InvalidData`;
    /// [`RollIndex::ensure`] rebuilds it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::IndexMissing(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let version = schema_version(&conn)?;
        if version != LATEST_VERSION {
            return Err(Error::InvalidData(format!(
                "roll index {} is at schema version {version}, expected {LATEST_VERSION}",
                path.display()
            )));
        }
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Open the index for `manifest`, building it first if it is missing or
    /// out of date.
    pub fn ensure(manifest: &Path) -> Result<Self> {
        let path = Self::path_for(manifest);
        match Self::open(&path) {
            Ok(index) => return Ok(index),
            Err(Error::IndexMissing(_) | Error::InvalidData(_)) => {}
            Err(e) => return Err(e),
        }

        let _guard = BUILD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished the build while we waited.
        match Self::open(&path) {
            Ok(index) => Ok(index),
            Err(Error::IndexMissing(_) | Error::InvalidData(_)) => build_locked(manifest),
            Err(e) => Err(e),
        }
    }

    /// Build the index for `manifest` from scratch, replacing any existing one.
    ///
    /// The index is written to a staging file and renamed into place, so
    /// readers never see a half-built index.
    pub fn build(manifest: &Path) -> Result<Self> {
        let _guard = BUILD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        build_locked(manifest)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of indexed weapons.
    pub fn weapon_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM weapons", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

/// Caller must hold `BUILD_LOCK`.
fn build_locked(manifest: &Path) -> Result<RollIndex> {
    let db = ManifestDb::open(manifest)?;
    let path = RollIndex::path_for(manifest);
    let staging = staging_path(&path);

    log::info!("Building roll index for {}", manifest.display());
    let written = write_index(&db, manifest, &staging);
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&staging) {
            log::debug!("Could not remove {}: {cleanup}", staging.display());
        }
        return Err(e);
    }

    fs::rename(&staging, &path)?;
    RollIndex::open(&path)
}

/// `<index>.<pid>-<n>.tmp`, unique across processes and builds.
fn staging_path(index: &Path) -> PathBuf {
    let mut staging = index.as_os_str().to_owned();
    let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
    staging.push(format!(".{}-{seq}.tmp", std::process::id()));
    PathBuf::from(staging)
}

fn write_index(db: &ManifestDb, manifest: &Path, staging: &Path) -> Result<()> {
    if staging.exists() {
        fs::remove_file(staging)?;
    }
    let mut conn = Connection::open(staging)?;
    apply_migrations(&conn)?;
    let tx = conn.transaction()?;
    let count = index_weapons(db, &tx)?;
    tx.execute(
        "INSERT OR REPLACE INTO index_source (id, manifest) VALUES (1, ?1)",
        [manifest.to_string_lossy()],
    )?;
    tx.commit()?;
    log::info!("Indexed {count} weapons");
    Ok(())
}

/// Highest applied migration, or 0 for a database without migrations.
fn schema_version(conn: &Connection) -> Result<u32> {
    let has_table: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if has_table.is_none() {
        return Ok(0);
    }
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

fn apply_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let applied: Vec<u32> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for migration in MIGRATIONS {
        if !applied.contains(&migration.version) {
            log::debug!(
                "Applying roll index migration {} ({})",
                migration.version,
                migration.name
            );
            conn.execute_batch(migration.sql)?;
            conn.execute(
                "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                params![migration.version, migration.name],
            )?;
        }
    }

    Ok(())
}

fn index_weapons(db: &ManifestDb, tx: &Transaction<'_>) -> Result<usize> {
    let mut count = 0;
    for (id, def) in db.weapons()? {
        if def.item_category_hashes.contains(&DUMMY_CATEGORY) {
            continue;
        }
        let Some(sockets) = &def.sockets else {
            continue;
        };
        let columns = match weapon_columns(db, sockets) {
            Ok(columns) => columns,
            Err(e) if e.is_parse_failure() => {
                log::warn!("Skipping {}: {e}", def.display_properties.name);
                continue;
            }
            Err(e) => return Err(e),
        };

        insert_weapon(tx, id, &def, &columns)?;
        count += 1;
    }
    Ok(count)
}

fn insert_weapon(
    tx: &Transaction<'_>,
    id: i64,
    def: &InventoryItemDefinition,
    columns: &[(RollColumn, Vec<String>)],
) -> Result<()> {
    let weapon_type = WeaponArchetype::from_categories(&def.item_category_hashes, 0, 0)
        .weapon_type
        .map(|t| t.label());
    tx.execute(
        "INSERT OR REPLACE INTO weapons (id, hash, name, weapon_type) VALUES (?1, ?2, ?3, ?4)",
        params![id, def.hash, def.display_properties.name, weapon_type],
    )?;

    let mut stmt = tx.prepare_cached(
        "INSERT OR IGNORE INTO weapon_perks (column_name, perk_name, weapon_id)
         VALUES (?1, ?2, ?3)",
    )?;
    for (column, perks) in columns {
        for perk in perks {
            stmt.execute(params![column.as_str(), perk, id])?;
        }
    }
    Ok(())
}

/// The perks a weapon can roll, per column.
fn weapon_columns(db: &ManifestDb, sockets: &SocketsBlock) -> Result<Vec<(RollColumn, Vec<String>)>> {
    let socket_at = |index: usize| {
        sockets
            .socket_entries
            .get(index)
            .ok_or_else(|| Error::InvalidData(format!("socket index {index} out of range")))
    };
    let mut columns = Vec::new();

    for category in &sockets.socket_categories {
        match SocketCategory::from_hash(category.socket_category_hash) {
            Some(SocketCategory::Intrinsics) => {
                let Some(&index) = category.socket_indexes.first() else {
                    continue;
                };
                let Some(plug_set) = socket_at(index)?.reusable_plug_set_hash else {
                    continue;
                };
                if let Some(&frame) = db.plug_set_items(plug_set, false)?.first() {
                    let names = plug_names(db, &[frame])?;
                    columns.push((RollColumn::Intrinsics, names));
                }
            }
            Some(SocketCategory::WeaponPerks) => {
                let mut seen_trait = false;
                for &index in &category.socket_indexes {
                    let socket = socket_at(index)?;
                    let Some(plug_category) = db.socket_plug_category(socket.socket_type_hash)?
                    else {
                        continue;
                    };
                    let Some(plug_set) = socket.rollable_plug_set() else {
                        continue;
                    };
                    let column = RollColumn::from_plug_category(plug_category, seen_trait);
                    if plug_category == PlugCategory::Perks {
                        seen_trait = true;
                    }
                    let names = plug_names(db, &db.plug_set_items(plug_set, true)?)?;
                    columns.push((column, names));
                }
            }
            None => {}
        }
    }

    Ok(columns)
}

fn plug_names(db: &ManifestDb, hashes: &[u32]) -> Result<Vec<String>> {
    let mut names = Vec::with_capacity(hashes.len());
    for &hash in hashes {
        if let Some(props) = db.display_properties(hash)? {
            names.push(props.name);
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashes::convert_hash;
    use crate::testkit;

    fn manifest() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world_sql_content_abc.content");
        testkit::write_fixture_manifest(&path).unwrap();
        (dir, path)
    }

    fn perks(index: &RollIndex, column: RollColumn, weapon: u32) -> Vec<String> {
        let mut stmt = index
            .conn()
            .prepare(
                "SELECT perk_name FROM weapon_perks
                 WHERE column_name = ?1 AND weapon_id = ?2 ORDER BY perk_name",
            )
            .unwrap();
        stmt.query_map(params![column.as_str(), convert_hash(weapon)], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap()
    }

    #[test]
    fn test_path_for_appends_suffix() {
        let path = RollIndex::path_for(Path::new("/data/world_sql_content_abc.content"));
        assert_eq!(path, PathBuf::from("/data/world_sql_content_abc.content.weapons"));
    }

    #[test]
    fn test_build_indexes_weapons_without_dummies() {
        let (_dir, manifest) = manifest();
        let index = RollIndex::build(&manifest).unwrap();
        assert_eq!(index.path(), RollIndex::path_for(&manifest));
        assert_eq!(index.weapon_count().unwrap(), 4);
    }

    #[test]
    fn test_build_splits_trait_columns() {
        let (_dir, manifest) = manifest();
        let index = RollIndex::build(&manifest).unwrap();

        assert_eq!(
            perks(&index, RollColumn::Intrinsics, testkit::FATEBRINGER),
            vec!["Adaptive Frame"]
        );
        assert_eq!(
            perks(&index, RollColumn::Perks1, testkit::FATEBRINGER),
            vec!["Outlaw"]
        );
        assert_eq!(
            perks(&index, RollColumn::Perks2, testkit::FATEBRINGER),
            vec!["Explosive Payload", "Kill Clip", "Rampage"]
        );
        assert_eq!(
            perks(&index, RollColumn::Barrels, testkit::VISION_OF_CONFLUENCE),
            vec!["Arrowhead Brake", "Corkscrew Rifling"]
        );
    }

    #[test]
    fn test_build_replaces_existing_index() {
        let (_dir, manifest) = manifest();
        RollIndex::build(&manifest).unwrap();
        let rebuilt = RollIndex::build(&manifest).unwrap();
        assert_eq!(rebuilt.weapon_count().unwrap(), 4);
    }

    #[test]
    fn test_ensure_reuses_existing_index() {
        let (_dir, manifest) = manifest();
        let built = RollIndex::ensure(&manifest).unwrap();
        let modified = fs::metadata(built.path()).unwrap().modified().unwrap();
        drop(built);

        let reopened = RollIndex::ensure(&manifest).unwrap();
        let again = fs::metadata(reopened.path()).unwrap().modified().unwrap();
        assert_eq!(modified, again);
    }

    #[test]
    fn test_open_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let err = RollIndex::open(dir.path().join("nope.weapons")).unwrap_err();
        assert!(matches!(err, Error::IndexMissing(_)));
    }

    #[test]
    fn test_latest_version_matches_migrations() {
        assert_eq!(MIGRATIONS.last().map(|m| m.version), Some(LATEST_VERSION));
    }

    #[test]
    fn test_weapon_type_from_unsorted_categories() {
        let (_dir, manifest) = manifest();
        let index = RollIndex::build(&manifest).unwrap();
        // The timelost reissue lists its categories as [6, 2, 1].
        let weapon_type: Option<String> = index
            .conn()
            .query_row(
                "SELECT weapon_type FROM weapons WHERE id = ?1",
                [convert_hash(testkit::FATEBRINGER_TIMELOST)],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(weapon_type.as_deref(), Some("Hand Cannon"));
    }

    #[test]
    fn test_ensure_rebuilds_outdated_index() {
        let (_dir, manifest) = manifest();
        let path = RollIndex::path_for(&manifest);
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE schema_migrations (version INTEGER PRIMARY KEY, name TEXT NOT NULL);
                 INSERT INTO schema_migrations (version, name) VALUES (1, 'weapon_perks');",
            )
            .unwrap();
        }
        assert!(matches!(RollIndex::open(&path), Err(Error::InvalidData(_))));

        let index = RollIndex::ensure(&manifest).unwrap();
        assert_eq!(index.weapon_count().unwrap(), 4);
    }

    #[test]
    fn test_concurrent_ensure_and_build() {
        let (dir, manifest) = manifest();
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let manifest = manifest.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        let index = if i % 3 == 0 {
                            RollIndex::build(&manifest)
                        } else {
                            RollIndex::ensure(&manifest)
                        }
                        .unwrap();
                        assert_eq!(index.weapon_count().unwrap(), 4);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }
}
