use crate::analysis::metrics::{
    blocked_time_hours, cycle_time_days, flow_efficiency, lead_time_days, reopen_rate, wip_count,
};
use crate::models::snapshot::MetricSnapshot;
use crate::models::team::{HistoryPoint, TeamMember, TeamMemberRecord};
use crate::models::work_item::{WorkItem, WorkItemRecord};
use rusqlite::{params, Connection, Result};

const DB_SCHEMA_VERSION: i64 = 2;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 2 {
        apply_migration_2(conn)?;
        version = 2;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        log::warn!("Database schema version {version} is newer than supported {DB_SCHEMA_VERSION}");
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS work_items (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            team TEXT NOT NULL DEFAULT '',
            sprint TEXT,
            created_at INTEGER NOT NULL,
            record_json TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS team_members (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT '',
            team TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            capacity REAL NOT NULL DEFAULT 0,
            weekly_capacity_hours REAL NOT NULL DEFAULT 0,
            history_json TEXT NOT NULL DEFAULT '[]',
            updated_at INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS metric_snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp INTEGER NOT NULL,
            item_count INTEGER NOT NULL,
            cycle_time_days REAL NOT NULL,
            lead_time_days REAL NOT NULL,
            wip INTEGER NOT NULL,
            reopen_rate REAL NOT NULL,
            flow_efficiency REAL NOT NULL,
            blocked_hours REAL NOT NULL,
            snapshot_metadata TEXT
        );
        ",
    )
}

fn apply_migration_2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_work_items_created_at ON work_items(created_at);
        CREATE INDEX IF NOT EXISTS idx_work_items_status ON work_items(status);
        CREATE INDEX IF NOT EXISTS idx_work_items_sprint ON work_items(sprint);
        CREATE INDEX IF NOT EXISTS idx_metric_snapshots_timestamp ON metric_snapshots(timestamp);
        ",
    )
}

pub fn get_db_connection(workspace_path: &str) -> Result<Connection> {
    let dir = std::path::Path::new(workspace_path).join(".nuvio");
    std::fs::create_dir_all(&dir).map_err(|_| rusqlite::Error::InvalidPath(dir.clone()))?;
    let conn = Connection::open(dir.join("state.db"))?;
    initialize_schema(&conn)?;
    Ok(conn)
}

pub fn upsert_work_items(conn: &Connection, items: &[WorkItem]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    write_work_items(&tx, items)?;
    tx.commit()
}

fn write_work_items(conn: &Connection, items: &[WorkItem]) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    for item in items {
        let record = WorkItemRecord::from(item.clone());
        let record_json = serde_json::to_string(&record)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        conn.execute(
            "
            INSERT INTO work_items (id, status, team, sprint, created_at, record_json, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                team = excluded.team,
                sprint = excluded.sprint,
                created_at = excluded.created_at,
                record_json = excluded.record_json,
                updated_at = excluded.updated_at
            ",
            params![
                item.id(),
                item.status().label(),
                item.team(),
                item.sprint(),
                item.created_at().timestamp_millis(),
                record_json,
                now,
            ],
        )?;
    }
    Ok(())
}

/// Loads every stored work item, oldest first. Rows that no longer pass
/// validation are skipped.
pub fn load_work_items(conn: &Connection) -> Result<Vec<WorkItem>> {
    let mut stmt = conn.prepare("SELECT id, record_json FROM work_items ORDER BY created_at ASC, id ASC")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

    let mut items = Vec::new();
    for row in rows {
        let (id, record_json) = row?;
        let parsed = serde_json::from_str::<WorkItemRecord>(&record_json)
            .map_err(|e| e.to_string())
            .and_then(|record| WorkItem::try_from(record).map_err(|e| e.to_string()));
        match parsed {
            Ok(item) => items.push(item),
            Err(e) => log::warn!("Skipping stored work item {id}: {e}"),
        }
    }
    Ok(items)
}

pub fn upsert_team_members(conn: &Connection, members: &[TeamMember]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    write_team_members(&tx, members)?;
    tx.commit()
}

fn write_team_members(conn: &Connection, members: &[TeamMember]) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    for member in members {
        let history_json = serde_json::to_string(member.history())
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        conn.execute(
            "
            INSERT INTO team_members (id, name, role, team, email, capacity, weekly_capacity_hours, history_json, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                role = excluded.role,
                team = excluded.team,
                email = excluded.email,
                capacity = excluded.capacity,
                weekly_capacity_hours = excluded.weekly_capacity_hours,
                history_json = excluded.history_json,
                updated_at = excluded.updated_at
            ",
            params![
                member.id(),
                member.name(),
                member.role(),
                member.team(),
                member.email(),
                member.capacity(),
                member.weekly_capacity_hours(),
                history_json,
                now,
            ],
        )?;
    }
    Ok(())
}

/// Loads every stored team member. Rows with unreadable history or values
/// that fail validation are skipped.
pub fn load_team_members(conn: &Connection) -> Result<Vec<TeamMember>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, role, team, email, capacity, weekly_capacity_hours, history_json FROM team_members ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        let record = TeamMemberRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            role: row.get(2)?,
            team: row.get(3)?,
            email: row.get(4)?,
            capacity: row.get(5)?,
            weekly_capacity_hours: row.get(6)?,
            history: Vec::new(),
        };
        Ok((record, row.get::<_, String>(7)?))
    })?;

    let mut members = Vec::new();
    for row in rows {
        let (record, history_json) = row?;
        let id = record.id.clone();
        let parsed = serde_json::from_str::<Vec<HistoryPoint>>(&history_json)
            .map_err(|e| format!("unreadable history: {e}"))
            .and_then(|history| {
                TeamMember::try_from(TeamMemberRecord { history, ..record }).map_err(|e| e.to_string())
            });
        match parsed {
            Ok(member) => members.push(member),
            Err(e) => log::warn!("Skipping stored team member {id}: {e}"),
        }
    }
    Ok(members)
}

/// Swaps the stored work items and team members for new ones in a single
/// transaction. Snapshots are kept. On error nothing changes.
pub fn replace_dataset(conn: &Connection, items: &[WorkItem], members: &[TeamMember]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch("DELETE FROM work_items; DELETE FROM team_members;")?;
    write_work_items(&tx, items)?;
    write_team_members(&tx, members)?;
    tx.commit()
}

/// Upserts imported items and members together, so a failed import leaves
/// the stored dataset untouched.
pub fn import_dataset(conn: &Connection, items: &[WorkItem], members: &[TeamMember]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    write_work_items(&tx, items)?;
    write_team_members(&tx, members)?;
    tx.commit()
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(count as usize)
}

pub fn last_snapshot_time(conn: &Connection) -> Option<i64> {
    conn.query_row("SELECT MAX(timestamp) FROM metric_snapshots", [], |row| row.get(0))
        .ok()
        .flatten()
}

pub fn insert_snapshot(
    conn: &Connection,
    items: &[WorkItem],
    timestamp: i64,
    metadata_json: Option<String>,
) -> Result<MetricSnapshot> {
    let mut snapshot = MetricSnapshot {
        id: 0,
        timestamp,
        item_count: items.len(),
        cycle_time_days: cycle_time_days(items),
        lead_time_days: lead_time_days(items),
        wip: wip_count(items) as usize,
        reopen_rate: reopen_rate(items),
        flow_efficiency: flow_efficiency(items),
        blocked_hours: blocked_time_hours(items),
        snapshot_metadata: metadata_json,
    };

    conn.execute(
        "INSERT INTO metric_snapshots (timestamp, item_count, cycle_time_days, lead_time_days, wip, reopen_rate, flow_efficiency, blocked_hours, snapshot_metadata) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            snapshot.timestamp,
            snapshot.item_count as i64,
            snapshot.cycle_time_days,
            snapshot.lead_time_days,
            snapshot.wip as i64,
            snapshot.reopen_rate,
            snapshot.flow_efficiency,
            snapshot.blocked_hours,
            snapshot.snapshot_metadata,
        ],
    )?;
    snapshot.id = conn.last_insert_rowid();
    Ok(snapshot)
}

pub fn load_snapshots(conn: &Connection) -> Result<Vec<MetricSnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT id, timestamp, item_count, cycle_time_days, lead_time_days, wip, reopen_rate, flow_efficiency, blocked_hours, snapshot_metadata FROM metric_snapshots ORDER BY timestamp ASC, id ASC",
    )?;
    let snapshots = stmt
        .query_map([], |row| {
            Ok(MetricSnapshot {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                item_count: row.get::<_, i64>(2)? as usize,
                cycle_time_days: row.get(3)?,
                lead_time_days: row.get(4)?,
                wip: row.get::<_, i64>(5)? as usize,
                reopen_rate: row.get(6)?,
                flow_efficiency: row.get(7)?,
                blocked_hours: row.get(8)?,
                snapshot_metadata: row.get(9)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(snapshots)
}

#[cfg_attr(feature = "desktop", tauri::command)]
pub async fn take_snapshot(
    workspace_path: String,
    metadata_json: Option<String>,
) -> Result<MetricSnapshot, String> {
    tokio::task::spawn_blocking(move || {
        let conn = get_db_connection(&workspace_path).map_err(|e| format!("DB error: {e}"))?;
        let items = load_work_items(&conn).map_err(|e| format!("Query error: {e}"))?;
        let snapshot = insert_snapshot(&conn, &items, chrono::Utc::now().timestamp(), metadata_json)
            .map_err(|e| format!("Insert error: {e}"))?;
        log::info!("Recorded metric snapshot {} over {} items", snapshot.id, snapshot.item_count);
        Ok(snapshot)
    })
    .await
    .map_err(|e| format!("Snapshot task failed: {e}"))?
}

#[cfg_attr(feature = "desktop", tauri::command)]
pub async fn get_metric_snapshots(workspace_path: String) -> Result<Vec<MetricSnapshot>, String> {
    let conn = get_db_connection(&workspace_path).map_err(|e| format!("DB error: {e}"))?;
    load_snapshots(&conn).map_err(|e| format!("Query error: {e}"))
}
