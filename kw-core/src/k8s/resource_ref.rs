use std::fmt;

use kube::Resource;

use super::KubernetesError;

// Identity of a watched object.  Once a wait begins this is never modified; everything that needs
// to know "what are we waiting on" takes a &ResourceRef.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ResourceRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    pub fn new(kind: &str, namespace: &str, name: &str) -> ResourceRef {
        ResourceRef {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn of<K: Resource<DynamicType = ()>>(namespace: &str, name: &str) -> ResourceRef {
        ResourceRef::new(&K::kind(&()), namespace, name)
    }

    pub fn from_obj<K: Resource<DynamicType = ()>>(obj: &K) -> anyhow::Result<ResourceRef> {
        let kind = K::kind(&());
        let meta = obj.meta();
        let Some(name) = meta.name.as_deref() else {
            return Err(KubernetesError::missing_name(&kind));
        };
        let Some(namespace) = meta.namespace.as_deref() else {
            return Err(KubernetesError::missing_namespace(&format!("{kind} {name}")));
        };
        Ok(ResourceRef::new(&kind, namespace, name))
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}
