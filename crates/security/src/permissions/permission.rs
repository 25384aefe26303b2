//! Permission strings and their parsed form
//!
//! A permission is an `ACTION_SCOPE_ENTITY` triple. Every position may hold
//! `*` (grants any value) or, on the requesting side, `ANY` (accept whatever
//! is granted). Comparison is case-insensitive; segments are uppercased once
//! at parse time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SEPARATOR: char = '_';
const WILDCARD: &str = "*";
const ANY: &str = "ANY";

/// Why a string is not a single well-formed permission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("permission '{permission}' looks like several permissions joined with ','")]
    Combined { permission: String },

    #[error("permission '{permission}' has {found} segments, expected ACTION_SCOPE_ENTITY")]
    SegmentCount { permission: String, found: usize },
}

/// One position of a permission
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// `ANY`
    Any,
    /// `*`
    Wildcard,
    /// Uppercased literal value
    Named(String),
}

impl Segment {
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            WILDCARD => Segment::Wildcard,
            ANY => Segment::Any,
            _ => Segment::Named(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Segment::Any => ANY,
            Segment::Wildcard => WILDCARD,
            Segment::Named(name) => name,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entities the evaluator knows how to reason about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Entity {
    Project,
    Layer,
    Page,
    Line,
    Member,
    Role,
    Permission,
    Tool,
    #[serde(rename = "*")]
    Wildcard,
    Any,
}

impl Entity {
    pub const ALL: [Entity; 10] = [
        Entity::Project,
        Entity::Layer,
        Entity::Page,
        Entity::Line,
        Entity::Member,
        Entity::Role,
        Entity::Permission,
        Entity::Tool,
        Entity::Wildcard,
        Entity::Any,
    ];

    /// The whitelisted entity named by `segment`, if any
    pub fn from_segment(segment: &Segment) -> Option<Self> {
        match segment {
            Segment::Any => Some(Entity::Any),
            Segment::Wildcard => Some(Entity::Wildcard),
            Segment::Named(name) => match name.as_str() {
                "PROJECT" => Some(Entity::Project),
                "LAYER" => Some(Entity::Layer),
                "PAGE" => Some(Entity::Page),
                "LINE" => Some(Entity::Line),
                "MEMBER" => Some(Entity::Member),
                "ROLE" => Some(Entity::Role),
                "PERMISSION" => Some(Entity::Permission),
                "TOOL" => Some(Entity::Tool),
                _ => None,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Project => "PROJECT",
            Entity::Layer => "LAYER",
            Entity::Page => "PAGE",
            Entity::Line => "LINE",
            Entity::Member => "MEMBER",
            Entity::Role => "ROLE",
            Entity::Permission => "PERMISSION",
            Entity::Tool => "TOOL",
            Entity::Wildcard => WILDCARD,
            Entity::Any => ANY,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `ACTION_SCOPE_ENTITY` permission
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission {
    pub action: Segment,
    pub scope: Segment,
    pub entity: Segment,
}

impl Permission {
    pub fn new(action: Segment, scope: Segment, entity: Segment) -> Self {
        Self {
            action,
            scope,
            entity,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, PermissionError> {
        if raw.contains(',') {
            return Err(PermissionError::Combined {
                permission: raw.to_string(),
            });
        }

        let parts: Vec<&str> = raw.split(SEPARATOR).collect();
        match parts.as_slice() {
            [action, scope, entity] => Ok(Self::new(
                Segment::parse(action),
                Segment::parse(scope),
                Segment::parse(entity),
            )),
            _ => Err(PermissionError::SegmentCount {
                permission: raw.to_string(),
                found: parts.len(),
            }),
        }
    }

    /// The whitelisted entity, `None` when the evaluator does not recognise it
    pub fn known_entity(&self) -> Option<Entity> {
        Entity::from_segment(&self.entity)
    }

    pub fn segments(&self) -> [&Segment; 3] {
        [&self.action, &self.scope, &self.entity]
    }
}

impl FromStr for Permission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.action, self.scope, self.entity)
    }
}
