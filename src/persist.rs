//! Persistence of script values across a save/resume boundary.
//!
//! A runtime serializes its globals through one [`PersistStorage`]. Handles
//! are not written inline: their traces and class references are appended to
//! deduplicating tables of the storage and the value records a positional id
//! into those tables. Ids are valid only together with the storage of the
//! same pass.
//!
//! ```text
//! Instance handle  -> {"kind":"instance","id":0,"exposedTypeName":"Computer"}
//! Class handle     -> {"kind":"classInstance","id":0,"exposedTypeName":"ComputerClass"}
//! Member owner     -> {"kind":"reference","id":1}
//! ```
//!
//! Plain references are native classes: the owner of a bound member and the
//! declaring class of a reflected one. Objects are always reached through a
//! trace.
//!
//! Decoding rebuilds fresh handles bound by exposed name. A target that did
//! not survive the reload still decodes; dereferencing it later fails with
//! `InstanceInvalid`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use netbridge_core::{
    BoundMember, ClassHandle, Dynamic, ExposedType, InstanceHandle, MemberKind, PersistError, ScriptHandle,
    Trace, TypeHash,
};
use netbridge_registry::BridgeRegistry;

use crate::wait::WaitState;

/// Reconstructable stand-in for a handle or reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PersistToken {
    /// Trace id and exposed type of an instance handle
    #[serde(rename_all = "camelCase")]
    Instance { id: usize, exposed_type_name: String },
    /// Class reference id and exposed type of a class handle
    #[serde(rename_all = "camelCase")]
    ClassInstance { id: usize, exposed_type_name: String },
    /// Plain reference id
    Reference { id: usize },
}

/// Persisted form of a bound member's kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PersistedMemberKind {
    Library,
    Reflected { declaring: PersistToken },
    ClassLibrary,
    Introspection,
}

/// Persisted form of a [`Dynamic`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PersistedValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<PersistedValue>),
    Handle(PersistToken),
    /// Bound member, re-bound by lookup on decode
    #[serde(rename_all = "camelCase")]
    Member {
        name: String,
        kind: PersistedMemberKind,
        owner: PersistToken,
        /// Exposed type the member was bound through
        owner_type_name: String,
    },
}

/// Trace and reference tables of one persist pass, plus the wait state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistStorage {
    traces: Vec<Trace>,
    references: Vec<TypeHash>,
    wait: WaitState,
}

impl PersistStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `trace`, appending it unless a trace to the same target is
    /// already stored.
    pub fn add_trace(&mut self, trace: &Trace) -> usize {
        if let Some(id) = self.traces.iter().position(|t| t == trace) {
            return id;
        }
        self.traces.push(trace.clone());
        self.traces.len() - 1
    }

    /// Trace stored under `id`.
    pub fn trace(&self, id: usize) -> Result<&Trace, PersistError> {
        self.traces.get(id).ok_or(PersistError::UnknownTrace(id))
    }

    /// Id of `class` in the reference table, appending it if new.
    pub fn add_reference(&mut self, class: TypeHash) -> usize {
        if let Some(id) = self.references.iter().position(|r| *r == class) {
            return id;
        }
        self.references.push(class);
        self.references.len() - 1
    }

    /// Class stored under reference `id`.
    pub fn reference(&self, id: usize) -> Result<TypeHash, PersistError> {
        self.references
            .get(id)
            .copied()
            .ok_or(PersistError::UnknownReference(id))
    }

    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub fn wait(&self) -> &WaitState {
        &self.wait
    }

    pub fn set_wait(&mut self, wait: WaitState) {
        self.wait = wait;
    }

    // ==========================================================================
    // Handles
    // ==========================================================================

    /// Token for `handle`, appending its trace or class to the tables.
    pub fn persist_handle(&mut self, handle: &ScriptHandle) -> PersistToken {
        match handle {
            ScriptHandle::Instance(h) => PersistToken::Instance {
                id: self.add_trace(&h.trace),
                exposed_type_name: h.exposed.name().to_string(),
            },
            ScriptHandle::Class(h) => PersistToken::ClassInstance {
                id: self.add_reference(h.class),
                exposed_type_name: h.exposed.name().to_string(),
            },
        }
    }

    /// Fresh handle for a token produced by this storage.
    pub fn unpersist_handle(
        &self,
        registry: &BridgeRegistry,
        token: &PersistToken,
    ) -> Result<ScriptHandle, PersistError> {
        match token {
            PersistToken::Instance { id, exposed_type_name } => {
                let trace = self.trace(*id)?.clone();
                let exposed = exposed_by_name(registry, exposed_type_name)?;
                Ok(ScriptHandle::Instance(InstanceHandle::new(trace, exposed)))
            }
            PersistToken::ClassInstance { id, exposed_type_name } => {
                let class = self.reference(*id)?;
                let exposed = exposed_by_name(registry, exposed_type_name)?;
                Ok(ScriptHandle::Class(ClassHandle::new(class, exposed)))
            }
            PersistToken::Reference { id } => {
                let class = self.reference(*id)?;
                let binding = registry
                    .find_class_binding(class)
                    .ok_or(PersistError::UnknownReference(*id))?;
                Ok(ScriptHandle::Class(ClassHandle::new(class, binding.exposed.clone())))
            }
        }
    }

    // ==========================================================================
    // Values
    // ==========================================================================

    /// Persisted form of `value`, appending its handles to the tables.
    pub fn persist(&mut self, value: &Dynamic) -> PersistedValue {
        match value {
            Dynamic::Nil => PersistedValue::Nil,
            Dynamic::Bool(b) => PersistedValue::Bool(*b),
            Dynamic::Int(i) => PersistedValue::Int(*i),
            Dynamic::Float(f) => PersistedValue::Float(*f),
            Dynamic::String(s) => PersistedValue::String(s.clone()),
            Dynamic::Array(items) => PersistedValue::Array(items.iter().map(|item| self.persist(item)).collect()),
            Dynamic::Handle(handle) => PersistedValue::Handle(self.persist_handle(handle)),
            Dynamic::Member(member) => self.persist_member(member),
        }
    }

    /// Rebuild a value persisted with this storage.
    pub fn unpersist(&self, registry: &BridgeRegistry, value: &PersistedValue) -> Result<Dynamic, PersistError> {
        Ok(match value {
            PersistedValue::Nil => Dynamic::Nil,
            PersistedValue::Bool(b) => Dynamic::Bool(*b),
            PersistedValue::Int(i) => Dynamic::Int(*i),
            PersistedValue::Float(f) => Dynamic::Float(*f),
            PersistedValue::String(s) => Dynamic::String(s.clone()),
            PersistedValue::Array(items) => Dynamic::Array(
                items
                    .iter()
                    .map(|item| self.unpersist(registry, item))
                    .collect::<Result<_, _>>()?,
            ),
            PersistedValue::Handle(token) => Dynamic::Handle(self.unpersist_handle(registry, token)?),
            PersistedValue::Member {
                name,
                kind,
                owner,
                owner_type_name,
            } => Dynamic::Member(Arc::new(self.unpersist_member(registry, name, kind, owner, owner_type_name)?)),
        })
    }

    fn persist_member(&mut self, member: &BoundMember) -> PersistedValue {
        let kind = match member.kind {
            MemberKind::Library => PersistedMemberKind::Library,
            MemberKind::Reflected { declaring } => PersistedMemberKind::Reflected {
                declaring: self.class_token(declaring),
            },
            MemberKind::ClassLibrary => PersistedMemberKind::ClassLibrary,
            MemberKind::Introspection => PersistedMemberKind::Introspection,
        };
        PersistedValue::Member {
            name: member.name.clone(),
            kind,
            owner: self.class_token(member.owner.class),
            owner_type_name: member.owner.name().to_string(),
        }
    }

    fn unpersist_member(
        &self,
        registry: &BridgeRegistry,
        name: &str,
        kind: &PersistedMemberKind,
        owner: &PersistToken,
        owner_type_name: &str,
    ) -> Result<BoundMember, PersistError> {
        let class = self.token_class(owner)?;
        let kind = match kind {
            PersistedMemberKind::Library => MemberKind::Library,
            PersistedMemberKind::Reflected { declaring } => MemberKind::Reflected {
                declaring: self.token_class(declaring)?,
            },
            PersistedMemberKind::ClassLibrary => MemberKind::ClassLibrary,
            PersistedMemberKind::Introspection => MemberKind::Introspection,
        };

        // The name must still bind the class the member was resolved on.
        let owner = exposed_by_name(registry, owner_type_name)?;
        if owner.class != class {
            return Err(PersistError::UnknownType(owner_type_name.to_string()));
        }
        Ok(BoundMember::new(name, owner, kind))
    }

    fn class_token(&mut self, class: TypeHash) -> PersistToken {
        PersistToken::Reference {
            id: self.add_reference(class),
        }
    }

    fn token_class(&self, token: &PersistToken) -> Result<TypeHash, PersistError> {
        match token {
            PersistToken::Reference { id } => self.reference(*id),
            PersistToken::Instance { id, .. } | PersistToken::ClassInstance { id, .. } => {
                Err(PersistError::WrongReferenceKind { id: *id, expected: "plain" })
            }
        }
    }
}

fn exposed_by_name(registry: &BridgeRegistry, name: &str) -> Result<ExposedType, PersistError> {
    registry
        .find_type(name)
        .map(|binding| binding.exposed.clone())
        .ok_or_else(|| PersistError::UnknownType(name.to_string()))
}
