use std::collections::BTreeMap;

use crate::error::StorageError;
use crate::models::{DrillingInfo, FieldRecord, FieldRecordId, LandRegistry, Project, ProjectId};
use crate::storage::Storage;

/// In-process store for previews and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    pub projects: BTreeMap<ProjectId, Project>,
    pub land_registry: BTreeMap<ProjectId, LandRegistry>,
    pub drilling_info: BTreeMap<ProjectId, DrillingInfo>,
    pub field_records: Vec<FieldRecord>,
    /// While set, every write fails and leaves the store untouched.
    pub fail_writes: bool,
    next_project_id: i64,
    next_record_id: i64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// One project with a stored drilling depth.
    pub fn with_sample_project(drilling_depth_m: f64) -> (Self, ProjectId) {
        let mut storage = Self::new();
        let id = storage.allocate_project_id();
        storage.projects.insert(
            id,
            Project {
                id: Some(id),
                name: "Parsel 112/4 zemin etüdü".to_string(),
                contractor: Some("Anadolu Sondaj".to_string()),
                responsible_engineer: Some("Jeoloji Müh.".to_string()),
            },
        );
        storage.drilling_info.insert(
            id,
            DrillingInfo {
                project_id: id,
                drilling_depth_m: Some(drilling_depth_m),
                ..DrillingInfo::default()
            },
        );
        (storage, id)
    }

    fn allocate_project_id(&mut self) -> ProjectId {
        self.next_project_id += 1;
        ProjectId(self.next_project_id)
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::WriteRejected(
                "memory storage is read-only".to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_project(&self, id: ProjectId) -> Result<(), StorageError> {
        if self.projects.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::ProjectNotFound(id))
        }
    }

    fn with_ids(&mut self, id: ProjectId, records: Vec<FieldRecord>) -> Vec<FieldRecord> {
        records
            .into_iter()
            .map(|mut record| {
                self.next_record_id += 1;
                record.id = Some(FieldRecordId(self.next_record_id));
                record.project_id = id;
                record
            })
            .collect()
    }
}

impl Storage for MemoryStorage {
    fn upsert_project(&mut self, mut project: Project) -> Result<Project, StorageError> {
        self.check_writable()?;
        let id = match project.id {
            Some(id) => {
                self.ensure_project(id)?;
                id
            }
            None => self.allocate_project_id(),
        };
        project.id = Some(id);
        self.projects.insert(id, project.clone());
        Ok(project)
    }

    fn load_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError> {
        Ok(self.projects.get(&id).cloned())
    }

    fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        Ok(self.projects.values().cloned().collect())
    }

    fn delete_project(&mut self, id: ProjectId) -> Result<(), StorageError> {
        self.check_writable()?;
        if self.projects.remove(&id).is_none() {
            return Err(StorageError::ProjectNotFound(id));
        }
        self.land_registry.remove(&id);
        self.drilling_info.remove(&id);
        self.field_records.retain(|r| r.project_id != id);
        Ok(())
    }

    fn upsert_land_registry(&mut self, land: LandRegistry) -> Result<(), StorageError> {
        self.check_writable()?;
        self.ensure_project(land.project_id)?;
        self.land_registry.insert(land.project_id, land);
        Ok(())
    }

    fn load_land_registry(&self, id: ProjectId) -> Result<Option<LandRegistry>, StorageError> {
        Ok(self.land_registry.get(&id).cloned())
    }

    fn upsert_drilling_info(&mut self, info: DrillingInfo) -> Result<(), StorageError> {
        self.check_writable()?;
        self.ensure_project(info.project_id)?;
        self.drilling_info.insert(info.project_id, info);
        Ok(())
    }

    fn load_drilling_info(&self, id: ProjectId) -> Result<Option<DrillingInfo>, StorageError> {
        Ok(self.drilling_info.get(&id).cloned())
    }

    fn delete_field_records(&mut self, id: ProjectId) -> Result<(), StorageError> {
        self.check_writable()?;
        self.field_records.retain(|r| r.project_id != id);
        Ok(())
    }

    fn insert_field_records(
        &mut self,
        id: ProjectId,
        records: Vec<FieldRecord>,
    ) -> Result<Vec<FieldRecord>, StorageError> {
        self.check_writable()?;
        self.ensure_project(id)?;
        let stored = self.with_ids(id, records);
        self.field_records.extend(stored.iter().cloned());
        Ok(stored)
    }

    fn replace_field_records(
        &mut self,
        id: ProjectId,
        records: Vec<FieldRecord>,
    ) -> Result<Vec<FieldRecord>, StorageError> {
        self.check_writable()?;
        self.ensure_project(id)?;
        let stored = self.with_ids(id, records);
        self.field_records.retain(|r| r.project_id != id);
        self.field_records.extend(stored.iter().cloned());
        Ok(stored)
    }

    fn list_field_records(&self, id: ProjectId) -> Result<Vec<FieldRecord>, StorageError> {
        let mut records: Vec<FieldRecord> = self
            .field_records
            .iter()
            .filter(|r| r.project_id == id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.depth_m.total_cmp(&b.depth_m).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    fn update_field_record(&mut self, record: FieldRecord) -> Result<(), StorageError> {
        self.check_writable()?;
        let id = record.id.ok_or(StorageError::MissingRecordId)?;
        let existing = self
            .field_records
            .iter_mut()
            .find(|r| r.id == Some(id))
            .ok_or(StorageError::RecordNotFound(id))?;
        let project_id = existing.project_id;
        *existing = FieldRecord {
            project_id,
            ..record
        };
        Ok(())
    }

    fn delete_field_record(&mut self, id: FieldRecordId) -> Result<(), StorageError> {
        self.check_writable()?;
        let before = self.field_records.len();
        self.field_records.retain(|r| r.id != Some(id));
        if self.field_records.len() == before {
            return Err(StorageError::RecordNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_ids_and_owner() {
        let (mut storage, id) = MemoryStorage::with_sample_project(6.0);
        let rows = vec![
            FieldRecord::at_depth(ProjectId(99), 1.5, 0.45),
            FieldRecord::at_depth(ProjectId(99), 0.0, 0.45),
        ];
        let stored = storage.insert_field_records(id, rows).unwrap();

        assert!(stored.iter().all(|r| r.id.is_some() && r.project_id == id));
        let listed = storage.list_field_records(id).unwrap();
        assert_eq!(listed[0].depth_m, 0.0);
        assert_eq!(listed[1].depth_m, 1.5);
    }

    #[test]
    fn test_insert_for_unknown_project() {
        let mut storage = MemoryStorage::new();
        let result = storage.insert_field_records(ProjectId(5), Vec::new());
        assert!(matches!(result, Err(StorageError::ProjectNotFound(ProjectId(5)))));
    }

    #[test]
    fn test_rejected_replace_keeps_rows() {
        let (mut storage, id) = MemoryStorage::with_sample_project(6.0);
        storage
            .insert_field_records(id, vec![FieldRecord::at_depth(id, 0.0, 0.45)])
            .unwrap();

        storage.fail_writes = true;
        let result = storage.replace_field_records(id, Vec::new());
        assert!(result.is_err());
        assert_eq!(storage.list_field_records(id).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_project_cascades() {
        let (mut storage, id) = MemoryStorage::with_sample_project(6.0);
        storage
            .insert_field_records(id, vec![FieldRecord::at_depth(id, 0.0, 0.45)])
            .unwrap();

        storage.delete_project(id).unwrap();
        assert!(storage.load_project(id).unwrap().is_none());
        assert!(storage.load_drilling_info(id).unwrap().is_none());
        assert!(storage.field_records.is_empty());
    }

    #[test]
    fn test_get_drilling_depth() {
        let (storage, id) = MemoryStorage::with_sample_project(13.5);
        assert_eq!(storage.get_drilling_depth(id).unwrap(), Some(13.5));
        assert_eq!(storage.get_drilling_depth(ProjectId(42)).unwrap(), None);
    }
}
