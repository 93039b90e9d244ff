/// Backend resource and view traits
///
/// A pooled target owns exactly one `Resource` and zero or more views.
/// Dropping the boxed trait object destroys the backend object.

use std::fmt;

/// Backend-unique identifier of a GPU resource
///
/// Views report the id of the resource they address so a `DeviceContext`
/// can resolve them without downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// GPU texture resource owned by a pooled target
pub trait Resource {
    /// Identifier of the backend object
    fn id(&self) -> ResourceId;
}

/// Shader-visible view of a target (sampled texture)
pub trait ShaderView {
    /// Identifier of the viewed resource
    fn resource_id(&self) -> ResourceId;
}

/// Render-target or depth-stencil view of a target
pub trait TargetView {
    /// Identifier of the viewed resource
    fn resource_id(&self) -> ResourceId;

    /// Array slice addressed by this view (`None` = every slice)
    fn slice(&self) -> Option<u32>;
}
