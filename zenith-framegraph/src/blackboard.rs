use zenith_core::collections::HashMap;
use crate::handle::ResourceHandle;

/// Named handles shared between code that builds different parts of a frame.
///
/// Entries are plain handles: a stored handle goes stale like any other once
/// its resource is written again, so producers should `put` the latest one.
#[derive(Default, Debug)]
pub struct Blackboard {
    entries: HashMap<String, ResourceHandle>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `handle` under `name`, returning the handle it replaces.
    pub fn put(&mut self, name: impl Into<String>, handle: ResourceHandle) -> Option<ResourceHandle> {
        self.entries.insert(name.into(), handle)
    }

    pub fn get(&self, name: &str) -> Option<ResourceHandle> {
        self.entries.get(name).copied()
    }

    pub fn remove(&mut self, name: &str) -> Option<ResourceHandle> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_remove() {
        let mut blackboard = Blackboard::new();
        let handle = ResourceHandle::new(4, 0);

        assert_eq!(blackboard.put("gbuffer", handle), None);
        assert!(blackboard.contains("gbuffer"));
        assert_eq!(blackboard.get("gbuffer"), Some(handle));
        assert_eq!(blackboard.get("depth"), None);

        assert_eq!(blackboard.remove("gbuffer"), Some(handle));
        assert!(blackboard.is_empty());
    }

    #[test]
    fn put_replaces_previous_entry() {
        let mut blackboard = Blackboard::new();
        let first = ResourceHandle::new(1, 0);
        let second = first.with_version(1);

        blackboard.put("color", first);
        assert_eq!(blackboard.put("color", second), Some(first));
        assert_eq!(blackboard.get("color"), Some(second));
        assert_eq!(blackboard.len(), 1);
    }
}
