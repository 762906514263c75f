//! In-memory provider recording everything stacks do to their scopes

use cairn_core::Environment;
use cairn_stack::{
    Aspect, AspectFinding, ConstructView, ParameterHandle, ParameterSpec, ProvisionError,
    Provisioner, Scope, ScopeKind,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Snapshot of one scope
#[derive(Debug, Clone)]
pub struct ScopeRecord {
    pub id: String,
    /// `root-id/child-id/...`
    pub path: String,
    pub kind: ScopeKind,
    pub outputs: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub aspects: Vec<Arc<dyn Aspect>>,
    pub parameters: BTreeMap<String, ParameterSpec>,
    pub imports: Vec<ParameterHandle>,
    /// Constructs granting actions, as `(construct id, actions)`
    pub grants: Vec<(String, Vec<String>)>,
}

impl ScopeRecord {
    fn new(id: &str, path: String, kind: ScopeKind) -> Self {
        Self {
            id: id.to_string(),
            path,
            kind,
            outputs: BTreeMap::new(),
            tags: BTreeMap::new(),
            aspects: Vec::new(),
            parameters: BTreeMap::new(),
            imports: Vec::new(),
            grants: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, ScopeKind::Root(_))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    scopes: Vec<ScopeRecord>,
    reject_roots: Option<String>,
}

impl MemoryState {
    fn record_mut(&mut self, path: &str) -> Result<&mut ScopeRecord, ProvisionError> {
        self.scopes
            .iter_mut()
            .find(|record| record.path == path)
            .ok_or_else(|| ProvisionError::Rejected(format!("unknown scope '{path}'")))
    }
}

/// [`Provisioner`] keeping every scope in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryProvisioner {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that refuses to create top-level scopes
    pub fn rejecting_roots(reason: impl Into<String>) -> Self {
        let provisioner = Self::new();
        provisioner.state.lock().reject_roots = Some(reason.into());
        provisioner
    }

    pub fn scopes(&self) -> Vec<ScopeRecord> {
        self.state.lock().scopes.clone()
    }

    /// First scope with this id
    pub fn scope(&self, id: &str) -> Option<ScopeRecord> {
        self.state
            .lock()
            .scopes
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    pub fn roots(&self) -> Vec<ScopeRecord> {
        self.scopes().into_iter().filter(ScopeRecord::is_root).collect()
    }

    /// Scopes nested directly in the scope with id `parent_id`
    pub fn children_of(&self, parent_id: &str) -> Vec<ScopeRecord> {
        self.scopes()
            .into_iter()
            .filter(|record| matches!(&record.kind, ScopeKind::Nested(parent) if parent == parent_id))
            .collect()
    }

    /// Created parameter with this persisted name, from any scope
    pub fn parameter_by_name(&self, parameter_name: &str) -> Option<ParameterSpec> {
        self.state
            .lock()
            .scopes
            .iter()
            .flat_map(|record| record.parameters.values())
            .find(|spec| spec.parameter_name == parameter_name)
            .cloned()
    }

    /// Record a construct in scope `scope_id` that grants `actions`
    pub fn grant(&self, scope_id: &str, construct: &str, actions: &[&str]) {
        let mut state = self.state.lock();
        if let Some(record) = state.scopes.iter_mut().find(|record| record.id == scope_id) {
            record.grants.push((
                construct.to_string(),
                actions.iter().map(|a| (*a).to_string()).collect(),
            ));
        }
    }

    /// Run every attached aspect over the constructs of its scope and all nested scopes
    pub fn synthesize(&self) -> Vec<AspectFinding> {
        let state = self.state.lock();
        let mut findings = Vec::new();

        for owner in &state.scopes {
            let nested_prefix = format!("{}/", owner.path);
            for aspect in &owner.aspects {
                for record in state
                    .scopes
                    .iter()
                    .filter(|r| r.path == owner.path || r.path.starts_with(&nested_prefix))
                {
                    for (construct, actions) in &record.grants {
                        let path = format!("{}/{}", record.path, construct);
                        findings.extend(aspect.visit(&ConstructView {
                            path: &path,
                            actions,
                        }));
                    }
                }
            }
        }

        findings
    }

    fn insert_scope(
        &self,
        owner: &str,
        id: &str,
        path: String,
        kind: ScopeKind,
    ) -> Result<Box<dyn Scope>, ProvisionError> {
        let mut state = self.state.lock();
        if state.scopes.iter().any(|record| record.path == path) {
            return Err(ProvisionError::DuplicateId {
                scope: owner.to_string(),
                id: id.to_string(),
            });
        }
        state.scopes.push(ScopeRecord::new(id, path.clone(), kind));

        Ok(Box::new(MemoryScope {
            id: id.to_string(),
            path,
            provisioner: self.clone(),
        }))
    }
}

impl Provisioner for MemoryProvisioner {
    fn create_root_scope(
        &self,
        id: &str,
        env: &Environment,
    ) -> Result<Box<dyn Scope>, ProvisionError> {
        if let Some(reason) = self.state.lock().reject_roots.clone() {
            return Err(ProvisionError::Rejected(reason));
        }
        self.insert_scope("app", id, id.to_string(), ScopeKind::Root(env.clone()))
    }
}

/// Scope handle backed by [`MemoryProvisioner`]
#[derive(Debug)]
pub struct MemoryScope {
    id: String,
    path: String,
    provisioner: MemoryProvisioner,
}

impl MemoryScope {
    fn with_record<R>(
        &self,
        f: impl FnOnce(&mut ScopeRecord) -> Result<R, ProvisionError>,
    ) -> Result<R, ProvisionError> {
        let mut state = self.provisioner.state.lock();
        f(state.record_mut(&self.path)?)
    }

    fn duplicate(&self, id: &str) -> ProvisionError {
        ProvisionError::DuplicateId {
            scope: self.id.clone(),
            id: id.to_string(),
        }
    }
}

impl Scope for MemoryScope {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ScopeKind {
        self.provisioner
            .state
            .lock()
            .scopes
            .iter()
            .find(|record| record.path == self.path)
            .map_or_else(|| ScopeKind::Nested(String::new()), |record| record.kind.clone())
    }

    fn create_nested_scope(&self, id: &str) -> Result<Box<dyn Scope>, ProvisionError> {
        self.provisioner.insert_scope(
            &self.id,
            id,
            format!("{}/{}", self.path, id),
            ScopeKind::Nested(self.id.clone()),
        )
    }

    fn add_output(&self, name: &str, value: &str) -> Result<(), ProvisionError> {
        self.with_record(|record| {
            if record.outputs.contains_key(name) {
                return Err(self.duplicate(name));
            }
            record.outputs.insert(name.to_string(), value.to_string());
            Ok(())
        })
    }

    fn add_tag(&self, key: &str, value: &str) -> Result<(), ProvisionError> {
        self.with_record(|record| {
            record.tags.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn add_aspect(&self, aspect: Arc<dyn Aspect>) -> Result<(), ProvisionError> {
        self.with_record(|record| {
            record.aspects.push(aspect);
            Ok(())
        })
    }

    fn create_string_parameter(
        &self,
        id: &str,
        spec: &ParameterSpec,
    ) -> Result<ParameterHandle, ProvisionError> {
        self.with_record(|record| {
            if record.parameters.contains_key(id) {
                return Err(self.duplicate(id));
            }
            record.parameters.insert(id.to_string(), spec.clone());
            Ok(ParameterHandle {
                id: id.to_string(),
                parameter_name: spec.parameter_name.clone(),
                scope_id: self.id.clone(),
                imported: false,
            })
        })
    }

    fn import_string_parameter(
        &self,
        id: &str,
        parameter_name: &str,
    ) -> Result<ParameterHandle, ProvisionError> {
        self.with_record(|record| {
            let handle = ParameterHandle {
                id: id.to_string(),
                parameter_name: parameter_name.to_string(),
                scope_id: self.id.clone(),
                imported: true,
            };
            record.imports.push(handle.clone());
            Ok(handle)
        })
    }
}
