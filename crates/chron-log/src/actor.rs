//! Actor resolution: who is performing the current unit of work.

use chron_core::EntityRef;

/// Port answering "who is the current actor under this auth guard?".
pub trait ActorResolver {
    fn current_actor(&self, guard: &str) -> Option<EntityRef>;
}

/// No authenticated actor, ever.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoActor;

impl ActorResolver for NoActor {
    fn current_actor(&self, _guard: &str) -> Option<EntityRef> {
        None
    }
}

/// The same actor under every guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedActor(pub EntityRef);

impl ActorResolver for FixedActor {
    fn current_actor(&self, _guard: &str) -> Option<EntityRef> {
        Some(self.0.clone())
    }
}

impl<F> ActorResolver for F
where
    F: Fn(&str) -> Option<EntityRef>,
{
    fn current_actor(&self, guard: &str) -> Option<EntityRef> {
        self(guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_resolve_per_guard() {
        let resolver = |guard: &str| (guard == "web").then(|| EntityRef::new("User", "7"));
        assert_eq!(
            resolver.current_actor("web"),
            Some(EntityRef::new("User", "7"))
        );
        assert_eq!(resolver.current_actor("api"), None);
    }

    #[test]
    fn fixed_and_none() {
        let admin = EntityRef::new("Admin", "1");
        assert_eq!(FixedActor(admin.clone()).current_actor("any"), Some(admin));
        assert_eq!(NoActor.current_actor("web"), None);
    }
}
