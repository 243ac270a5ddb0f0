use tracing::warn;

use crate::error::StorageError;
use crate::models::{DrillingInfo, FieldRecord, FieldRecordId, LandRegistry, Project, ProjectId};

/// Project-scoped record store.
///
/// Field records are wholly owned by their project; deleting a project
/// removes its land-registry entry, drilling parameters and field records.
pub trait Storage {
    /// Insert when `project.id` is `None`, otherwise update. Returns the stored project.
    fn upsert_project(&mut self, project: Project) -> Result<Project, StorageError>;
    fn load_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError>;
    fn list_projects(&self) -> Result<Vec<Project>, StorageError>;
    fn delete_project(&mut self, id: ProjectId) -> Result<(), StorageError>;

    fn upsert_land_registry(&mut self, land: LandRegistry) -> Result<(), StorageError>;
    fn load_land_registry(&self, id: ProjectId) -> Result<Option<LandRegistry>, StorageError>;

    fn upsert_drilling_info(&mut self, info: DrillingInfo) -> Result<(), StorageError>;
    fn load_drilling_info(&self, id: ProjectId) -> Result<Option<DrillingInfo>, StorageError>;

    /// Stored drilling depth, the default target for metraj generation.
    fn get_drilling_depth(&self, id: ProjectId) -> Result<Option<f64>, StorageError> {
        Ok(self
            .load_drilling_info(id)?
            .and_then(|info| info.drilling_depth_m))
    }

    /// Remove every field record of the project. Succeeds when there are none.
    fn delete_field_records(&mut self, id: ProjectId) -> Result<(), StorageError>;

    /// Append records under the project and return them with their assigned ids.
    fn insert_field_records(
        &mut self,
        id: ProjectId,
        records: Vec<FieldRecord>,
    ) -> Result<Vec<FieldRecord>, StorageError>;

    /// Swap the project's field records for `records`.
    ///
    /// Stores that support transactions override this so readers never see
    /// the project without rows; this default only issues the delete and the
    /// insert back to back.
    fn replace_field_records(
        &mut self,
        id: ProjectId,
        records: Vec<FieldRecord>,
    ) -> Result<Vec<FieldRecord>, StorageError> {
        self.delete_field_records(id)?;
        self.insert_field_records(id, records)
    }

    /// Save drilling parameters and swap the project's field records as one
    /// unit: on failure both the parameters and the rows stay as they were.
    ///
    /// The default puts the previous parameters back when the row replace
    /// fails. Transactional stores override it.
    fn save_drilling_info_with_records(
        &mut self,
        info: DrillingInfo,
        records: Vec<FieldRecord>,
    ) -> Result<Vec<FieldRecord>, StorageError> {
        let project_id = info.project_id;
        let previous = self.load_drilling_info(project_id)?;
        self.upsert_drilling_info(info)?;
        match self.replace_field_records(project_id, records) {
            Ok(stored) => Ok(stored),
            Err(err) => {
                let restore = previous.unwrap_or(DrillingInfo {
                    project_id,
                    ..DrillingInfo::default()
                });
                if let Err(restore_err) = self.upsert_drilling_info(restore) {
                    warn!(
                        project_id = project_id.0,
                        error = %restore_err,
                        "could not restore drilling parameters"
                    );
                }
                Err(err)
            }
        }
    }

    /// Field records of the project ordered by depth.
    fn list_field_records(&self, id: ProjectId) -> Result<Vec<FieldRecord>, StorageError>;

    fn count_field_records(&self, id: ProjectId) -> Result<usize, StorageError> {
        Ok(self.list_field_records(id)?.len())
    }

    /// Overwrite one existing row, matched by `record.id`.
    fn update_field_record(&mut self, record: FieldRecord) -> Result<(), StorageError>;
    fn delete_field_record(&mut self, id: FieldRecordId) -> Result<(), StorageError>;
}
