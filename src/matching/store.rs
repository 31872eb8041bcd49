use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::matching::errors::StoreError;
use crate::matching::objects::{Entity, Skill, UserType};

/// Чтение из хранилища пользователей.
pub trait EntityStore: Send + Sync {
    fn fetch_entity(&self, id: &str) -> Result<Entity, StoreError>;
    /// Сущности, подходящие под фильтр, в порядке хранения.
    fn list_entities(&self, filter: &EntityFilter) -> Result<Vec<Entity>, StoreError>;
}

// structs define

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityFilter {
    pub user_type: Option<UserType>,
    pub exclude_id: Option<String>,
}

/// Коллекция `users`: либо файл с документами, либо готовый список
pub struct DocumentStore {
    source: Source,
}

enum Source {
    /// Перечитывается при каждом обращении
    File(PathBuf),
    Entities(Vec<Entity>),
}

/// `_id` строкой или в extended JSON
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocumentId {
    Plain(String),
    ObjectId {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

#[derive(Debug, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: Option<DocumentId>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(rename = "userType")]
    user_type: Option<String>,
    #[serde(default)]
    skills: Vec<Skill>,
}

// Impl block

impl EntityFilter {
    pub fn user_type(user_type: UserType) -> EntityFilter {
        EntityFilter { user_type: Some(user_type), exclude_id: None }
    }

    pub fn excluding(mut self, id: &str) -> EntityFilter {
        self.exclude_id = Some(id.to_string());
        self
    }

    fn matches(&self, entity: &Entity) -> bool {
        if let Some(user_type) = self.user_type {
            if entity.user_type != user_type {
                return false;
            }
        }
        self.exclude_id.as_deref() != Some(entity.id.as_str())
    }
}

impl DocumentStore {
    pub fn from_entities(entities: Vec<Entity>) -> DocumentStore {
        DocumentStore { source: Source::Entities(entities) }
    }

    pub fn from_json(content: &str) -> Result<DocumentStore, StoreError> {
        Ok(DocumentStore::from_entities(parse_documents(content)?))
    }

    /// Хранилище поверх файла. Файл читается сразу, чтобы ошибки
    /// конфигурации всплыли на старте, и затем заново на каждый запрос.
    pub fn open(path: &Path) -> Result<DocumentStore, StoreError> {
        let users = read_documents(path)?.len();
        info!(?path, users, "user documents found");
        Ok(DocumentStore { source: Source::File(path.to_path_buf()) })
    }

    /// Текущее содержимое коллекции.
    pub fn snapshot(&self) -> Result<Vec<Entity>, StoreError> {
        match &self.source {
            Source::File(path) => read_documents(path),
            Source::Entities(entities) => Ok(entities.clone()),
        }
    }
}

impl EntityStore for DocumentStore {
    #[tracing::instrument(skip(self))]
    fn fetch_entity(&self, id: &str) -> Result<Entity, StoreError> {
        if id.trim().is_empty() {
            return Err(StoreError::InvalidInput("user id must not be empty".to_string()));
        }

        self.snapshot()?
            .into_iter()
            .find(|entity| entity.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    #[tracing::instrument(skip(self))]
    fn list_entities(&self, filter: &EntityFilter) -> Result<Vec<Entity>, StoreError> {
        let entities: Vec<Entity> = self
            .snapshot()?
            .into_iter()
            .filter(|entity| filter.matches(entity))
            .collect();
        debug!(count = entities.len(), "entities listed");
        Ok(entities)
    }
}

impl UserDocument {
    fn into_entity(self) -> Result<Entity, String> {
        let id = match self.id {
            Some(DocumentId::Plain(id)) | Some(DocumentId::ObjectId { oid: id }) => id,
            None => return Err("missing `_id`".to_string()),
        };
        if id.trim().is_empty() {
            return Err("empty `_id`".to_string());
        }

        let raw_type = self.user_type.ok_or("missing `userType`")?;
        let user_type = UserType::parse(&raw_type)
            .ok_or_else(|| format!("unknown `userType` '{}'", raw_type))?;

        let out_of_range = self
            .skills
            .iter()
            .find(|skill| !(0.0..=100.0).contains(&skill.proficiency));
        if let Some(skill) = out_of_range {
            return Err(format!(
                "skill '{}' has proficiency {} outside 0..=100",
                skill.name, skill.proficiency
            ));
        }

        Ok(Entity { id, name: self.name, email: self.email, user_type, skills: self.skills })
    }
}

// utils func

/// Разбирает JSON-массив документов. Невалидные документы пропускаются
/// с предупреждением, не ломая остальную коллекцию.
pub fn parse_documents(content: &str) -> Result<Vec<Entity>, StoreError> {
    let documents: Vec<UserDocument> = serde_json::from_str(content)?;

    let entities = documents
        .into_iter()
        .enumerate()
        .filter_map(|(index, document)| match document.into_entity() {
            Ok(entity) => Some(entity),
            Err(reason) => {
                warn!(index, %reason, "skipping invalid user document");
                None
            }
        })
        .collect();

    Ok(entities)
}

fn read_documents(path: &Path) -> Result<Vec<Entity>, StoreError> {
    let content = fs::read_to_string(path)
        .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
    parse_documents(&content)
}
