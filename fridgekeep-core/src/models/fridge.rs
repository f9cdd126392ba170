use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Storage zone of a compartment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompartmentType {
    Cool,
    Freeze,
    Pantry,
}

impl CompartmentType {
    /// Display name used for the seeded compartment of this type.
    pub fn default_name(&self) -> &'static str {
        match self {
            CompartmentType::Cool => "냉장실",
            CompartmentType::Freeze => "냉동실",
            CompartmentType::Pantry => "실온보관",
        }
    }
}

impl fmt::Display for CompartmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompartmentType::Cool => write!(f, "COOL"),
            CompartmentType::Freeze => write!(f, "FREEZE"),
            CompartmentType::Pantry => write!(f, "PANTRY"),
        }
    }
}

impl FromStr for CompartmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "COOL" => Ok(CompartmentType::Cool),
            "FREEZE" => Ok(CompartmentType::Freeze),
            "PANTRY" => Ok(CompartmentType::Pantry),
            _ => Err(format!(
                "Invalid compartment type '{}'. Valid types: cool, freeze, pantry",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Compartment {
    pub compartment_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub compartment_type: CompartmentType,
}

impl Compartment {
    pub fn new(name: impl Into<String>, compartment_type: CompartmentType) -> Self {
        Self {
            compartment_id: Uuid::new_v4().to_string(),
            name: name.into(),
            compartment_type,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Member => write!(f, "member"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FridgeMember {
    pub user_id: String,
    pub nickname: String,
    pub role: Role,
}

/// A fridge record with its compartments and member list.
///
/// Members are access-control metadata on this device's copy of the record.
/// Nothing propagates a fridge to other devices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fridge {
    pub fridge_id: String,
    pub name: String,
    /// Whether this is the viewing user's default. Each user picks their own,
    /// so repositories fill this in per reader; the stored value is ignored.
    #[serde(default)]
    pub is_default: bool,
    pub is_favorite: bool,
    pub memo: String,
    pub compartments: Vec<Compartment>,
    pub members: Vec<FridgeMember>,
    pub created_at: DateTime<Utc>,
}

impl Fridge {
    /// Creates a fridge owned by `owner_id`, seeded with the three default
    /// compartments.
    pub fn new(
        name: impl Into<String>,
        owner_id: impl Into<String>,
        owner_nickname: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            fridge_id: Uuid::new_v4().to_string(),
            name: name.into(),
            is_default: false,
            is_favorite: false,
            memo: String::new(),
            compartments: Self::default_compartments(),
            members: vec![FridgeMember {
                user_id: owner_id.into(),
                nickname: owner_nickname.into(),
                role: Role::Owner,
            }],
            created_at,
        }
    }

    /// Replaces the seeded compartments.
    pub fn with_compartments(mut self, compartments: Vec<Compartment>) -> Self {
        self.compartments = compartments;
        self
    }

    /// COOL, FREEZE and PANTRY, in that order.
    pub fn default_compartments() -> Vec<Compartment> {
        [
            CompartmentType::Cool,
            CompartmentType::Freeze,
            CompartmentType::Pantry,
        ]
        .into_iter()
        .map(|t| Compartment::new(t.default_name(), t))
        .collect()
    }

    pub fn owner(&self) -> Option<&FridgeMember> {
        self.members.iter().find(|m| m.role == Role::Owner)
    }

    pub fn member(&self, user_id: &str) -> Option<&FridgeMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.member(user_id).is_some()
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.member(user_id).is_some_and(|m| m.role == Role::Owner)
    }

    pub fn compartment(&self, compartment_id: &str) -> Option<&Compartment> {
        self.compartments
            .iter()
            .find(|c| c.compartment_id == compartment_id)
    }

    /// Appends a compartment with a fresh id and returns that id.
    pub fn add_compartment(
        &mut self,
        name: impl Into<String>,
        compartment_type: CompartmentType,
    ) -> String {
        let compartment = Compartment::new(name, compartment_type);
        let id = compartment.compartment_id.clone();
        self.compartments.push(compartment);
        id
    }
}

impl fmt::Display for Fridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.is_default {
            flags.push("default");
        }
        if self.is_favorite {
            flags.push("favorite");
        }

        if flags.is_empty() {
            writeln!(f, "{}", self.name)?;
        } else {
            writeln!(f, "{} ({})", self.name, flags.join(", "))?;
        }
        writeln!(f, "{}", "=".repeat(self.name.chars().count().max(3)))?;
        writeln!(f, "ID: {}", self.fridge_id)?;

        if !self.memo.is_empty() {
            writeln!(f, "Memo: {}", self.memo)?;
        }

        writeln!(f, "\nCompartments:")?;
        for c in &self.compartments {
            writeln!(f, "  - {} [{}] {}", c.name, c.compartment_type, c.compartment_id)?;
        }

        writeln!(f, "\nMembers:")?;
        for m in &self.members {
            writeln!(f, "  - {} ({}) {}", m.nickname, m.role, m.user_id)?;
        }

        Ok(())
    }
}
