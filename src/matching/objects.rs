use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// structs define

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum UserType {
    Student,
    Mentor,
    Admin,
}

/// С какой стороной менторства сравнивается цель
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Pool {
    #[default]
    Mentors,
    Mentees,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default = "default_proficiency")]
    pub proficiency: f32,
}

/// Ментор или менти из хранилища пользователей
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    pub skills: Vec<Skill>,
}

/// Кандидат вместе с текстом, который пойдёт в модель
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub entity: Entity,
    pub skill_text: String,
}

/// Кандидат с оценкой сходства, как он уходит клиенту
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoredCandidate {
    /// ID кандидата
    pub id: String,
    pub name: String,
    pub email: String,
    /// Названия навыков через запятую, которые кодировались
    pub skills: String,
    /// Косинусное сходство с целью, в [-1, 1]
    pub similarity_score: f32,
}

// Impl block

impl UserType {
    pub fn parse(raw: &str) -> Option<UserType> {
        match raw {
            "Student" => Some(UserType::Student),
            "Mentor" => Some(UserType::Mentor),
            "Admin" => Some(UserType::Admin),
            _ => None,
        }
    }
}

impl Pool {
    /// Тип пользователей, из которых состоит пул
    pub fn user_type(self) -> UserType {
        match self {
            Pool::Mentors => UserType::Mentor,
            Pool::Mentees => UserType::Student,
        }
    }
}

impl Skill {
    pub fn new(name: &str) -> Skill {
        Skill { name: name.to_string(), proficiency: default_proficiency() }
    }
}

impl Entity {
    /// Названия навыков через ", " в порядке хранения, дубликаты сохраняются.
    pub fn skill_text(&self) -> String {
        join_skill_names(self.skills.iter().map(|skill| skill.name.as_str()))
    }
}

impl Candidate {
    pub fn new(entity: Entity) -> Candidate {
        let skill_text = entity.skill_text();
        Candidate { entity, skill_text }
    }

    pub fn score(&self, similarity_score: f32) -> ScoredCandidate {
        ScoredCandidate {
            id: self.entity.id.clone(),
            name: self.entity.name.clone(),
            email: self.entity.email.clone(),
            skills: self.skill_text.clone(),
            similarity_score,
        }
    }
}

// utils func

pub fn join_skill_names<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names.into_iter().collect::<Vec<_>>().join(", ")
}

fn default_proficiency() -> f32 {
    50.0
}
