use std::fmt;
use std::sync::Arc;

use super::collector::MergedField;
use super::schema::TypeRef;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_owned())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Renders a path the way it shows up in logs, e.g. `/hero/friends/0/name`.
pub fn display_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "/".to_owned();
    }

    path.iter().map(|segment| format!("/{}", segment)).collect()
}

/// One position of the result tree.
///
/// Nodes are immutable and only link to their parent, so siblings executing
/// concurrently share the same ancestry without copying it.
#[derive(Clone, Debug)]
pub struct ExecutionStepInfo<'a> {
    field_type: TypeRef,
    runtime_type: Option<String>,
    field: Option<MergedField<'a>>,
    parent_type: Option<String>,
    segment: Option<PathSegment>,
    parent: Option<Arc<ExecutionStepInfo<'a>>>,
}

impl<'a> ExecutionStepInfo<'a> {
    /// The operation root. Its type is non-null so a collapse reaching it nulls `data`.
    pub fn root(root_type: &str) -> Arc<Self> {
        Arc::new(ExecutionStepInfo {
            field_type: TypeRef::non_null(TypeRef::named(root_type)),
            runtime_type: Some(root_type.to_owned()),
            field: None,
            parent_type: None,
            segment: None,
            parent: None,
        })
    }

    pub fn for_field(
        parent: &Arc<Self>,
        result_key: &str,
        field: MergedField<'a>,
        parent_type: &str,
        field_type: TypeRef,
    ) -> Arc<Self> {
        Arc::new(ExecutionStepInfo {
            field_type,
            runtime_type: None,
            field: Some(field),
            parent_type: Some(parent_type.to_owned()),
            segment: Some(PathSegment::Key(result_key.to_owned())),
            parent: Some(parent.clone()),
        })
    }

    /// List elements keep the field of the list they belong to.
    pub fn for_list_item(parent: &Arc<Self>, index: usize, item_type: TypeRef) -> Arc<Self> {
        Arc::new(ExecutionStepInfo {
            field_type: item_type,
            runtime_type: None,
            field: parent.field.clone(),
            parent_type: parent.parent_type.clone(),
            segment: Some(PathSegment::Index(index)),
            parent: Some(parent.clone()),
        })
    }

    pub fn with_runtime_type(&self, object_type: &str) -> Arc<Self> {
        let mut step_info = self.clone();
        step_info.runtime_type = Some(object_type.to_owned());
        Arc::new(step_info)
    }

    pub fn field_type(&self) -> &TypeRef {
        &self.field_type
    }

    pub fn is_non_null(&self) -> bool {
        self.field_type.is_non_null()
    }

    pub fn runtime_type(&self) -> Option<&str> {
        self.runtime_type.as_deref()
    }

    pub fn field(&self) -> Option<&MergedField<'a>> {
        self.field.as_ref()
    }

    pub fn parent_type(&self) -> Option<&str> {
        self.parent_type.as_deref()
    }

    pub fn parent(&self) -> Option<&Arc<ExecutionStepInfo<'a>>> {
        self.parent.as_ref()
    }

    pub fn segment(&self) -> Option<&PathSegment> {
        self.segment.as_ref()
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent.as_ref();

        while let Some(parent) = current {
            depth += 1;
            current = parent.parent.as_ref();
        }

        depth
    }

    pub fn path(&self) -> Vec<PathSegment> {
        let mut path = Vec::with_capacity(self.depth());
        let mut current = Some(self);

        while let Some(step_info) = current {
            if let Some(segment) = &step_info.segment {
                path.push(segment.clone());
            }
            current = step_info.parent.as_deref();
        }

        path.reverse();
        path
    }

    /// `Parent.field`, as used in error messages.
    pub fn field_coordinates(&self) -> String {
        match (&self.parent_type, &self.field) {
            (Some(parent_type), Some(field)) => format!("{}.{}", parent_type, field.name()),
            _ => self.field_type.to_string(),
        }
    }

    /// Owned snapshot handed to resolvers.
    pub fn view(&self) -> StepView {
        StepView {
            path: self.path(),
            field_name: self
                .field
                .as_ref()
                .map(|field| field.name().to_owned())
                .unwrap_or_default(),
            result_key: self
                .field
                .as_ref()
                .map(|field| field.result_key().to_owned())
                .unwrap_or_default(),
            parent_type: self.parent_type.clone().unwrap_or_default(),
            field_type: self.field_type.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StepView {
    pub path: Vec<PathSegment>,
    pub field_name: String,
    pub result_key: String,
    pub parent_type: String,
    pub field_type: TypeRef,
}
