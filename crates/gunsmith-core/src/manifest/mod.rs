//! Read-only access to a downloaded manifest file.

pub mod definitions;

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::hashes::{convert_hash, PlugCategory};

pub use definitions::{
    DefinitionTable, DisplayProperties, InventoryItemDefinition, PlugSetDefinition,
    SocketTypeDefinition,
};

/// A manifest row: the table id alongside the parsed definition.
pub type ItemRow = (i64, InventoryItemDefinition);

/// An open manifest database.
#[derive(Debug)]
pub struct ManifestDb {
    conn: Connection,
    path: PathBuf,
}

impl ManifestDb {
    /// Open the manifest at `path` read-only.
    ///
    /// Unlike [`Connection::open`], a missing file is an error rather than a
    /// freshly created empty database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ManifestMissing(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
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

    /// Fetch and parse a single definition by hash.
    pub fn definition<T: DeserializeOwned>(
        &self,
        table: DefinitionTable,
        hash: u32,
    ) -> Result<Option<T>> {
        let sql = format!("SELECT json FROM {} WHERE id = ?1", table.as_str());
        let json: Option<String> = self
            .conn
            .query_row(&sql, [convert_hash(hash)], |row| row.get(0))
            .optional()?;
        json.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Error::from)
    }

    /// Display properties of an inventory item.
    pub fn display_properties(&self, hash: u32) -> Result<Option<DisplayProperties>> {
        let json: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT json_extract(json, '$.displayProperties')
                 FROM DestinyInventoryItemDefinition WHERE id = ?1",
                [convert_hash(hash)],
                |row| row.get(0),
            )
            .optional()?;
        match json.flatten() {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Inventory items whose name contains `query`, case-insensitively.
    ///
    /// Rows whose JSON does not fit [`InventoryItemDefinition`] are skipped;
    /// fuzzy name searches routinely hit unrelated item kinds.
    pub fn search_items(&self, query: &str) -> Result<Vec<ItemRow>> {
        let pattern = format!("%{}%", escape_like(query));
        let mut stmt = self.conn.prepare(
            "SELECT id, json FROM DestinyInventoryItemDefinition
             WHERE json_extract(json, '$.displayProperties.name') LIKE ?1 ESCAPE '\\'",
        )?;
        let rows = stmt
            .query_map([pattern], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(parse_rows(rows))
    }

    /// Every inventory item carrying the weapon category and a sockets block.
    pub fn weapons(&self) -> Result<Vec<ItemRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT item.id, item.json
             FROM DestinyInventoryItemDefinition AS item,
                  json_each(item.json, '$.itemCategoryHashes') AS category
             WHERE category.value = ?1
               AND json_extract(item.json, '$.sockets') IS NOT NULL
             ORDER BY item.id",
        )?;
        let rows = stmt
            .query_map([crate::hashes::WEAPON_CATEGORY], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(parse_rows(rows))
    }

    /// Plug category accepted by a socket type, from the first whitelist entry.
    pub fn socket_plug_category(&self, socket_type_hash: u32) -> Result<Option<PlugCategory>> {
        let socket_type: Option<SocketTypeDefinition> =
            self.definition(DefinitionTable::SocketType, socket_type_hash)?;
        Ok(socket_type
            .and_then(|def| def.plug_whitelist.first().map(|entry| entry.category_hash))
            .and_then(PlugCategory::from_hash))
    }

    /// Plug item hashes in a plug set.
    ///
    /// With `rollable_only`, plugs that can no longer roll are left out.
    pub fn plug_set_items(&self, plug_set_hash: u32, rollable_only: bool) -> Result<Vec<u32>> {
        let plug_set: Option<PlugSetDefinition> =
            self.definition(DefinitionTable::PlugSet, plug_set_hash)?;
        let Some(plug_set) = plug_set else {
            log::warn!("Plug set {plug_set_hash} is missing from the manifest");
            return Ok(Vec::new());
        };
        Ok(plug_set
            .reusable_plug_items
            .into_iter()
            .filter(|item| !rollable_only || item.currently_can_roll)
            .map(|item| item.plug_item_hash)
            .collect())
    }
}

fn parse_rows(rows: Vec<(i64, String)>) -> Vec<ItemRow> {
    rows.into_iter()
        .filter_map(|(id, json)| match serde_json::from_str(&json) {
            Ok(def) => Some((id, def)),
            Err(e) => {
                log::debug!("Skipping item {id}: {e}");
                None
            }
        })
        .collect()
}

/// Escape `LIKE` wildcards so user input matches literally.
pub(crate) fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
