use crate::info::ClassInfo;
use crate::registry::ClassRegistry;

// -----------------------------------------------------------------------------
// ClassRegistration

/// A class submitted for automatic registration.
///
/// [`persist_class!`](crate::persist_class) submits one of these per
/// declared class; [`ClassRegistry::auto_register`] collects them.
pub struct ClassRegistration {
    pub name: &'static str,
    pub parent: Option<&'static str>,
    pub class_info: fn() -> ClassInfo,
}

inventory::collect!(ClassRegistration);

impl ClassRegistry {
    /// Drains the submitted registrations into this registry, registering
    /// parents before their derived classes regardless of submission order.
    pub(crate) fn collect_registrations(&mut self) {
        let mut pending: Vec<&ClassRegistration> =
            inventory::iter::<ClassRegistration>.into_iter().collect();
        while !pending.is_empty() {
            let before = pending.len();
            pending.retain(|registration| {
                if self.contains(registration.name) {
                    return false;
                }
                let ready = match registration.parent {
                    Some(parent) => self.contains(parent),
                    None => true,
                };
                if ready {
                    self.register_class((registration.class_info)());
                }
                !ready
            });
            if pending.len() == before {
                let stuck: Vec<_> = pending.iter().map(|r| r.name).collect();
                panic!("unresolvable parent classes for {stuck:?}");
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::persist_class;
    use crate::registry::ClassRegistry;

    // Declared derived before base so collection has to reorder.
    persist_class! {
        class AutoLeaf: AutoRoot via base {
            depth: i32,
        }
    }

    persist_class! {
        class AutoRoot {
            tag: u32,
        }
    }

    #[test]
    fn collects_submitted_classes() {
        let mut registry = ClassRegistry::new();
        assert!(registry.auto_register());
        assert!(registry.contains("AutoRoot"));
        assert!(registry.contains("AutoLeaf"));
        assert!(registry.is_derived("AutoLeaf", "AutoRoot"));
    }

    #[test]
    fn skips_manually_registered_classes() {
        let mut registry = ClassRegistry::new();
        registry.register::<AutoRoot>();
        registry.auto_register();
        assert!(registry.contains("AutoRoot"));
        assert!(registry.contains("AutoLeaf"));
    }
}
