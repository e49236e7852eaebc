//! Dependency table and resolver.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Entity categories that participate in cascades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Resume,
    Score,
    Job,
    Application,
    User,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::Score => "score",
            Self::Job => "job",
            Self::Application => "application",
            Self::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "resume" => Some(Self::Resume),
            "score" => Some(Self::Score),
            "job" => Some(Self::Job),
            "application" => Some(Self::Application),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutations that appear on either side of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Add,
    Update,
    Delete,
    Submit,
    Invalidate,
    Remove,
    RecalculateMatch,
    MarkApplied,
    Archive,
    DetachResume,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Submit => "submit",
            Self::Invalidate => "invalidate",
            Self::Remove => "remove",
            Self::RecalculateMatch => "recalculate-match",
            Self::MarkApplied => "mark-applied",
            Self::Archive => "archive",
            Self::DetachResume => "detach-resume",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "add" => Some(Self::Add),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "submit" => Some(Self::Submit),
            "invalidate" => Some(Self::Invalidate),
            "remove" => Some(Self::Remove),
            "recalculate-match" => Some(Self::RecalculateMatch),
            "mark-applied" => Some(Self::MarkApplied),
            "archive" => Some(Self::Archive),
            "detach-resume" => Some(Self::DetachResume),
            _ => None,
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One required follow-up mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cascade {
    pub entity: EntityKind,
    pub action: Action,
}

impl Cascade {
    pub const fn new(entity: EntityKind, action: Action) -> Self {
        Self { entity, action }
    }
}

impl Display for Cascade {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.entity, self.action)
    }
}

/// Static row: `source` must be followed by `affected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    pub source: Cascade,
    pub affected: Cascade,
}

const fn edge(
    source_entity: EntityKind,
    source_action: Action,
    affected_entity: EntityKind,
    affected_action: Action,
) -> DependencyEdge {
    DependencyEdge {
        source: Cascade::new(source_entity, source_action),
        affected: Cascade::new(affected_entity, affected_action),
    }
}

// Row order is significant: cascades run in the order listed per source.
const DEPENDENCY_TABLE: &[DependencyEdge] = &[
    edge(EntityKind::Resume, Action::Update, EntityKind::Score, Action::Invalidate),
    edge(EntityKind::Resume, Action::Update, EntityKind::Job, Action::RecalculateMatch),
    edge(EntityKind::Resume, Action::Delete, EntityKind::Score, Action::Remove),
    edge(EntityKind::Resume, Action::Delete, EntityKind::Application, Action::DetachResume),
    edge(EntityKind::Job, Action::Update, EntityKind::Job, Action::RecalculateMatch),
    edge(EntityKind::Job, Action::Delete, EntityKind::Application, Action::Archive),
    edge(EntityKind::Application, Action::Submit, EntityKind::Job, Action::MarkApplied),
];

static DEPENDENCY_INDEX: Lazy<BTreeMap<Cascade, Vec<Cascade>>> = Lazy::new(|| {
    let mut index: BTreeMap<Cascade, Vec<Cascade>> = BTreeMap::new();
    for row in DEPENDENCY_TABLE {
        index.entry(row.source).or_default().push(row.affected);
    }
    index
});

/// Returns the cascades required after `(entity, action)`, in table order.
///
/// Pairs with no row resolve to an empty slice.
pub fn resolve(entity: EntityKind, action: Action) -> &'static [Cascade] {
    DEPENDENCY_INDEX
        .get(&Cascade::new(entity, action))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// String-keyed variant of [`resolve`].
pub fn resolve_str(entity: &str, action: &str) -> Result<&'static [Cascade], DependencyError> {
    let entity = EntityKind::parse(entity)
        .ok_or_else(|| DependencyError::UnknownEntity(entity.to_string()))?;
    let action =
        Action::parse(action).ok_or_else(|| DependencyError::UnknownAction(action.to_string()))?;
    Ok(resolve(entity, action))
}

/// All static rows, in declaration order.
pub fn dependency_edges() -> &'static [DependencyEdge] {
    DEPENDENCY_TABLE
}

/// Returns whether following cascades can never revisit a node.
///
/// A self-edge such as `job/update -> job/recalculate-match` is fine because
/// the target is a different node.
pub fn is_acyclic() -> bool {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(node: Cascade, marks: &mut BTreeMap<Cascade, Mark>) -> bool {
        match marks.get(&node) {
            Some(Mark::Visiting) => return false,
            Some(Mark::Done) => return true,
            None => {}
        }
        marks.insert(node, Mark::Visiting);
        for next in resolve(node.entity, node.action) {
            if !visit(*next, marks) {
                return false;
            }
        }
        marks.insert(node, Mark::Done);
        true
    }

    let mut marks = BTreeMap::new();
    DEPENDENCY_INDEX
        .keys()
        .all(|source| visit(*source, &mut marks))
}

/// String lookup errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    UnknownEntity(String),
    UnknownAction(String),
}

impl Display for DependencyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownEntity(value) => write!(f, "unknown entity: {value}"),
            Self::UnknownAction(value) => write!(f, "unknown action: {value}"),
        }
    }
}

impl Error for DependencyError {}
