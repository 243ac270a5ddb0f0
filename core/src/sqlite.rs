use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::StorageError;
use crate::migrations;
use crate::models::{DrillingInfo, FieldRecord, FieldRecordId, LandRegistry, Project, ProjectId};
use crate::storage::Storage;

const SELECT_FIELD_RECORDS_SQL: &str = "SELECT id, project_id, depth_m, casing_depth_m, well_tests, sample_interval, sample_type_no, spt_0_15, spt_15_30, spt_30_45, n30, t_max, t_remoulded, cohesion_kpa, friction_angle_deg, natural_unit_weight_kn_m3, dry_unit_weight_kn_m3, soil_profile, soil_description FROM field_records WHERE project_id = ?1 ORDER BY depth_m, id";

const INSERT_FIELD_RECORD_SQL: &str = "INSERT INTO field_records (project_id, depth_m, casing_depth_m, well_tests, sample_interval, sample_type_no, spt_0_15, spt_15_30, spt_30_45, n30, t_max, t_remoulded, cohesion_kpa, friction_angle_deg, natural_unit_weight_kn_m3, dry_unit_weight_kn_m3, soil_profile, soil_description) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)";

const UPDATE_FIELD_RECORD_SQL: &str = "UPDATE field_records SET depth_m = ?2, casing_depth_m = ?3, well_tests = ?4, sample_interval = ?5, sample_type_no = ?6, spt_0_15 = ?7, spt_15_30 = ?8, spt_30_45 = ?9, n30 = ?10, t_max = ?11, t_remoulded = ?12, cohesion_kpa = ?13, friction_angle_deg = ?14, natural_unit_weight_kn_m3 = ?15, dry_unit_weight_kn_m3 = ?16, soil_profile = ?17, soil_description = ?18 WHERE id = ?1";

const UPSERT_LAND_REGISTRY_SQL: &str = "INSERT INTO land_registry (project_id, province, district, neighbourhood, block_no, sheet_no, parcel_no, coord_x, coord_y) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) ON CONFLICT(project_id) DO UPDATE SET province = excluded.province, district = excluded.district, neighbourhood = excluded.neighbourhood, block_no = excluded.block_no, sheet_no = excluded.sheet_no, parcel_no = excluded.parcel_no, coord_x = excluded.coord_x, coord_y = excluded.coord_y";

const UPSERT_DRILLING_INFO_SQL: &str = "INSERT INTO drilling_info (project_id, driller_name, collar_elevation_m, drilling_depth_m, start_date, end_date, borehole_diameter_mm, groundwater_level_m, ud_samples_note, soil_type, machine_type, spt_hammer_type) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) ON CONFLICT(project_id) DO UPDATE SET driller_name = excluded.driller_name, collar_elevation_m = excluded.collar_elevation_m, drilling_depth_m = excluded.drilling_depth_m, start_date = excluded.start_date, end_date = excluded.end_date, borehole_diameter_mm = excluded.borehole_diameter_mm, groundwater_level_m = excluded.groundwater_level_m, ud_samples_note = excluded.ud_samples_note, soil_type = excluded.soil_type, machine_type = excluded.machine_type, spt_hammer_type = excluded.spt_hammer_type";

/// SQLite-backed store. Foreign keys are enforced so project deletion
/// cascades to every dependent row.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::ensure_schema(&mut conn)?;
        Ok(Self { conn })
    }
}

fn ensure_project(conn: &Connection, id: ProjectId) -> Result<(), StorageError> {
    let found = conn
        .query_row("SELECT 1 FROM projects WHERE id = ?1", [id.0], |_| Ok(()))
        .optional()?;
    found.ok_or(StorageError::ProjectNotFound(id))
}

fn insert_rows(
    conn: &Connection,
    id: ProjectId,
    records: Vec<FieldRecord>,
) -> Result<Vec<FieldRecord>, StorageError> {
    let mut stmt = conn.prepare_cached(INSERT_FIELD_RECORD_SQL)?;
    let mut stored = Vec::with_capacity(records.len());
    for mut record in records {
        record.project_id = id;
        stmt.execute(params![
            id.0,
            record.depth_m,
            record.casing_depth_m,
            record.well_tests,
            record.sample_interval,
            record.sample_type_no,
            record.spt_0_15,
            record.spt_15_30,
            record.spt_30_45,
            record.n30,
            record.t_max,
            record.t_remoulded,
            record.cohesion_kpa,
            record.friction_angle_deg,
            record.natural_unit_weight_kn_m3,
            record.dry_unit_weight_kn_m3,
            record.soil_profile,
            record.soil_description,
        ])?;
        record.id = Some(FieldRecordId(conn.last_insert_rowid()));
        stored.push(record);
    }
    Ok(stored)
}

fn write_drilling_info(conn: &Connection, info: &DrillingInfo) -> Result<(), StorageError> {
    conn.execute(
        UPSERT_DRILLING_INFO_SQL,
        params![
            info.project_id.0,
            info.driller_name,
            info.collar_elevation_m,
            info.drilling_depth_m,
            info.start_date,
            info.end_date,
            info.borehole_diameter_mm,
            info.groundwater_level_m,
            info.ud_samples_note,
            info.soil_type,
            info.machine_type,
            info.spt_hammer_type,
        ],
    )?;
    Ok(())
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: Some(ProjectId(row.get(0)?)),
        name: row.get(1)?,
        contractor: row.get(2)?,
        responsible_engineer: row.get(3)?,
    })
}

fn field_record_from_row(row: &Row<'_>) -> rusqlite::Result<FieldRecord> {
    Ok(FieldRecord {
        id: Some(FieldRecordId(row.get(0)?)),
        project_id: ProjectId(row.get(1)?),
        depth_m: row.get(2)?,
        casing_depth_m: row.get(3)?,
        well_tests: row.get(4)?,
        sample_interval: row.get(5)?,
        sample_type_no: row.get(6)?,
        spt_0_15: row.get(7)?,
        spt_15_30: row.get(8)?,
        spt_30_45: row.get(9)?,
        n30: row.get(10)?,
        t_max: row.get(11)?,
        t_remoulded: row.get(12)?,
        cohesion_kpa: row.get(13)?,
        friction_angle_deg: row.get(14)?,
        natural_unit_weight_kn_m3: row.get(15)?,
        dry_unit_weight_kn_m3: row.get(16)?,
        soil_profile: row.get(17)?,
        soil_description: row.get(18)?,
    })
}

impl Storage for SqliteStorage {
    fn upsert_project(&mut self, mut project: Project) -> Result<Project, StorageError> {
        match project.id {
            None => {
                self.conn.execute(
                    "INSERT INTO projects (name, contractor, responsible_engineer) VALUES (?1, ?2, ?3)",
                    params![project.name, project.contractor, project.responsible_engineer],
                )?;
                project.id = Some(ProjectId(self.conn.last_insert_rowid()));
            }
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE projects SET name = ?2, contractor = ?3, responsible_engineer = ?4 WHERE id = ?1",
                    params![
                        id.0,
                        project.name,
                        project.contractor,
                        project.responsible_engineer
                    ],
                )?;
                if changed == 0 {
                    return Err(StorageError::ProjectNotFound(id));
                }
            }
        }
        Ok(project)
    }

    fn load_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, contractor, responsible_engineer FROM projects WHERE id = ?1",
                [id.0],
                project_from_row,
            )
            .optional()?)
    }

    fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, contractor, responsible_engineer FROM projects ORDER BY id")?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    fn delete_project(&mut self, id: ProjectId) -> Result<(), StorageError> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", [id.0])?;
        if changed == 0 {
            return Err(StorageError::ProjectNotFound(id));
        }
        Ok(())
    }

    fn upsert_land_registry(&mut self, land: LandRegistry) -> Result<(), StorageError> {
        ensure_project(&self.conn, land.project_id)?;
        self.conn.execute(
            UPSERT_LAND_REGISTRY_SQL,
            params![
                land.project_id.0,
                land.province,
                land.district,
                land.neighbourhood,
                land.block_no,
                land.sheet_no,
                land.parcel_no,
                land.coord_x,
                land.coord_y,
            ],
        )?;
        Ok(())
    }

    fn load_land_registry(&self, id: ProjectId) -> Result<Option<LandRegistry>, StorageError> {
        Ok(self
            .conn
            .query_row(
                "SELECT project_id, province, district, neighbourhood, block_no, sheet_no, parcel_no, coord_x, coord_y FROM land_registry WHERE project_id = ?1",
                [id.0],
                |row| {
                    Ok(LandRegistry {
                        project_id: ProjectId(row.get(0)?),
                        province: row.get(1)?,
                        district: row.get(2)?,
                        neighbourhood: row.get(3)?,
                        block_no: row.get(4)?,
                        sheet_no: row.get(5)?,
                        parcel_no: row.get(6)?,
                        coord_x: row.get(7)?,
                        coord_y: row.get(8)?,
                    })
                },
            )
            .optional()?)
    }

    fn upsert_drilling_info(&mut self, info: DrillingInfo) -> Result<(), StorageError> {
        ensure_project(&self.conn, info.project_id)?;
        write_drilling_info(&self.conn, &info)
    }

    fn load_drilling_info(&self, id: ProjectId) -> Result<Option<DrillingInfo>, StorageError> {
        Ok(self
            .conn
            .query_row(
                "SELECT project_id, driller_name, collar_elevation_m, drilling_depth_m, start_date, end_date, borehole_diameter_mm, groundwater_level_m, ud_samples_note, soil_type, machine_type, spt_hammer_type FROM drilling_info WHERE project_id = ?1",
                [id.0],
                |row| {
                    Ok(DrillingInfo {
                        project_id: ProjectId(row.get(0)?),
                        driller_name: row.get(1)?,
                        collar_elevation_m: row.get(2)?,
                        drilling_depth_m: row.get(3)?,
                        start_date: row.get(4)?,
                        end_date: row.get(5)?,
                        borehole_diameter_mm: row.get(6)?,
                        groundwater_level_m: row.get(7)?,
                        ud_samples_note: row.get(8)?,
                        soil_type: row.get(9)?,
                        machine_type: row.get(10)?,
                        spt_hammer_type: row.get(11)?,
                    })
                },
            )
            .optional()?)
    }

    fn delete_field_records(&mut self, id: ProjectId) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM field_records WHERE project_id = ?1", [id.0])?;
        Ok(())
    }

    fn insert_field_records(
        &mut self,
        id: ProjectId,
        records: Vec<FieldRecord>,
    ) -> Result<Vec<FieldRecord>, StorageError> {
        let tx = self.conn.transaction()?;
        ensure_project(&tx, id)?;
        let stored = insert_rows(&tx, id, records)?;
        tx.commit()?;
        Ok(stored)
    }

    fn replace_field_records(
        &mut self,
        id: ProjectId,
        records: Vec<FieldRecord>,
    ) -> Result<Vec<FieldRecord>, StorageError> {
        // Dropping `tx` on any early return rolls the delete back.
        let tx = self.conn.transaction()?;
        ensure_project(&tx, id)?;
        let removed = tx.execute("DELETE FROM field_records WHERE project_id = ?1", [id.0])?;
        let stored = insert_rows(&tx, id, records)?;
        tx.commit()?;
        debug!(
            project_id = id.0,
            removed,
            inserted = stored.len(),
            "replaced field records"
        );
        Ok(stored)
    }

    fn save_drilling_info_with_records(
        &mut self,
        info: DrillingInfo,
        records: Vec<FieldRecord>,
    ) -> Result<Vec<FieldRecord>, StorageError> {
        let id = info.project_id;
        let tx = self.conn.transaction()?;
        ensure_project(&tx, id)?;
        write_drilling_info(&tx, &info)?;
        tx.execute("DELETE FROM field_records WHERE project_id = ?1", [id.0])?;
        let stored = insert_rows(&tx, id, records)?;
        tx.commit()?;
        debug!(
            project_id = id.0,
            inserted = stored.len(),
            "saved drilling info with field records"
        );
        Ok(stored)
    }

    fn list_field_records(&self, id: ProjectId) -> Result<Vec<FieldRecord>, StorageError> {
        let mut stmt = self.conn.prepare_cached(SELECT_FIELD_RECORDS_SQL)?;
        let records = stmt
            .query_map([id.0], field_record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn count_field_records(&self, id: ProjectId) -> Result<usize, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM field_records WHERE project_id = ?1",
            [id.0],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn update_field_record(&mut self, record: FieldRecord) -> Result<(), StorageError> {
        let id = record.id.ok_or(StorageError::MissingRecordId)?;
        let changed = self.conn.execute(
            UPDATE_FIELD_RECORD_SQL,
            params![
                id.0,
                record.depth_m,
                record.casing_depth_m,
                record.well_tests,
                record.sample_interval,
                record.sample_type_no,
                record.spt_0_15,
                record.spt_15_30,
                record.spt_30_45,
                record.n30,
                record.t_max,
                record.t_remoulded,
                record.cohesion_kpa,
                record.friction_angle_deg,
                record.natural_unit_weight_kn_m3,
                record.dry_unit_weight_kn_m3,
                record.soil_profile,
                record.soil_description,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::RecordNotFound(id));
        }
        Ok(())
    }

    fn delete_field_record(&mut self, id: FieldRecordId) -> Result<(), StorageError> {
        let changed = self
            .conn
            .execute("DELETE FROM field_records WHERE id = ?1", [id.0])?;
        if changed == 0 {
            return Err(StorageError::RecordNotFound(id));
        }
        Ok(())
    }
}
