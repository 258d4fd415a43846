//! The configuration bag passed from parent to child at setup time.
//!
//! An [`EntityConfig`] has a small typed core (the rendering-surface handle)
//! plus an extension map for application fields. Bags are never mutated once
//! handed to a subtree: a parent that wants to add fields for its children
//! derives a new bag through a [`ChildConfig`].

use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{EntityError, EntityResult};

/// Opaque handle to the rendering surface an entity attaches to.
///
/// The composition core only forwards or overrides it, never inspects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub Uuid);

impl SurfaceHandle {
    /// Creates a fresh, unique handle.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Surface({})", self.0)
    }
}

/// Configuration bag shared read-only by a subtree.
///
/// Cloning is cheap: the extension map is reference counted.
#[derive(Debug, Clone)]
pub struct EntityConfig {
    surface: SurfaceHandle,
    extensions: Rc<Map<String, Value>>,
}

impl EntityConfig {
    /// Creates a bag with the given surface and no extension fields.
    #[must_use]
    pub fn new(surface: SurfaceHandle) -> Self {
        Self {
            surface,
            extensions: Rc::new(Map::new()),
        }
    }

    /// The rendering-surface handle.
    #[must_use]
    pub fn surface(&self) -> SurfaceHandle {
        self.surface
    }

    /// Raw access to an application field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    /// Typed access to an application field.
    ///
    /// Returns `Ok(None)` when the field is absent.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::Config`] if the field exists but does not
    /// deserialize into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> EntityResult<Option<T>> {
        self.extensions
            .get(key)
            .map(|value| {
                T::deserialize(value).map_err(|source| EntityError::Config {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Returns all application fields.
    #[must_use]
    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }

    /// Derives a new bag with `overrides` shallow-merged over this one.
    #[must_use]
    pub fn extended(&self, overrides: &Map<String, Value>) -> Self {
        if overrides.is_empty() {
            return self.clone();
        }
        let mut merged = (*self.extensions).clone();
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        Self {
            surface: self.surface,
            extensions: Rc::new(merged),
        }
    }

    /// Derives a new bag with a single field set.
    #[must_use]
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut overrides = Map::new();
        overrides.insert(key.into(), value.into());
        self.extended(&overrides)
    }

    /// Derives a new bag that targets a different surface.
    #[must_use]
    pub fn with_surface(&self, surface: SurfaceHandle) -> Self {
        Self {
            surface,
            extensions: Rc::clone(&self.extensions),
        }
    }
}

/// A pure function deriving a child's bag from its parent's.
pub type ConfigFn = Rc<dyn Fn(&EntityConfig) -> EntityConfig>;

/// How a composite derives the bag it hands to one child.
#[derive(Clone, Default)]
pub enum ChildConfig {
    /// The parent's bag, unmodified.
    #[default]
    Inherit,
    /// The parent's bag with these fields shallow-merged over it.
    Extend(Map<String, Value>),
    /// The result of a pure function of the parent's bag.
    Derive(ConfigFn),
}

impl ChildConfig {
    /// Shorthand for [`ChildConfig::Derive`].
    pub fn derive(f: impl Fn(&EntityConfig) -> EntityConfig + 'static) -> Self {
        Self::Derive(Rc::new(f))
    }

    /// Produces the child's bag.
    #[must_use]
    pub fn resolve(&self, parent: &EntityConfig) -> EntityConfig {
        match self {
            Self::Inherit => parent.clone(),
            Self::Extend(overrides) => parent.extended(overrides),
            Self::Derive(f) => f(parent),
        }
    }
}

impl fmt::Debug for ChildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inherit => f.write_str("Inherit"),
            Self::Extend(map) => f.debug_tuple("Extend").field(map).finish(),
            Self::Derive(_) => f.write_str("Derive(..)"),
        }
    }
}

impl From<Map<String, Value>> for ChildConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self::Extend(map)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn overrides(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_extend_does_not_mutate_parent() {
        let parent = EntityConfig::new(SurfaceHandle::new()).with("level", 1);
        let child = parent.extended(&overrides(json!({ "level": 2, "music": true })));
        assert_eq!(parent.get("level"), Some(&json!(1)));
        assert_eq!(parent.get("music"), None);
        assert_eq!(child.get("level"), Some(&json!(2)));
        assert_eq!(child.surface(), parent.surface());
    }

    #[test]
    fn test_child_config_variants() {
        let parent = EntityConfig::new(SurfaceHandle::new()).with("score", 10);
        let surface = SurfaceHandle::new();

        let inherited = ChildConfig::Inherit.resolve(&parent);
        assert_eq!(inherited.get("score"), Some(&json!(10)));

        let extended = ChildConfig::from(overrides(json!({ "score": 11 }))).resolve(&parent);
        assert_eq!(extended.get("score"), Some(&json!(11)));

        let derived = ChildConfig::derive(move |c| c.with_surface(surface)).resolve(&parent);
        assert_eq!(derived.surface(), surface);
        assert_eq!(derived.get("score"), Some(&json!(10)));
    }

    #[test]
    fn test_typed_access() {
        let config = EntityConfig::new(SurfaceHandle::new())
            .with("speed", 2.5)
            .with("name", "hero");
        assert_eq!(config.get_as::<f64>("speed").unwrap(), Some(2.5));
        assert_eq!(config.get_as::<u32>("missing").unwrap(), None);
        assert!(matches!(
            config.get_as::<u32>("name"),
            Err(EntityError::Config { .. })
        ));
    }
}
