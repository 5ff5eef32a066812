use crate::backend::ActorSource;
use crate::error::{FlowError, Result};
use crate::user::User;

/// The signed-in actor, passed explicitly to every workflow operation.
#[derive(Debug, Clone, Default)]
pub struct Session {
    actor: Option<User>,
}

impl Session {
    pub fn new(actor: User) -> Self {
        Self { actor: Some(actor) }
    }

    pub fn anonymous() -> Self {
        Self { actor: None }
    }

    /// Snapshot the auth provider's current actor.
    pub fn resolve(source: &dyn ActorSource) -> Self {
        Self {
            actor: source.current_actor(),
        }
    }

    pub fn actor(&self) -> Option<&User> {
        self.actor.as_ref()
    }

    /// The actor, or `NotAuthenticated` while nobody is signed in or the
    /// signed-in account has been deactivated.
    pub fn require_actor(&self) -> Result<&User> {
        match &self.actor {
            Some(u) if u.is_active => Ok(u),
            _ => Err(FlowError::NotAuthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    struct Fixed(Option<User>);

    impl ActorSource for Fixed {
        fn current_actor(&self) -> Option<User> {
            self.0.clone()
        }
    }

    #[test]
    fn anonymous_session_is_rejected() {
        let s = Session::resolve(&Fixed(None));
        assert!(matches!(s.require_actor(), Err(FlowError::NotAuthenticated)));
    }

    #[test]
    fn deactivated_actor_is_rejected() {
        let mut u = User::new("qc-1", "Kiran", "kiran@studio.test", Role::Qc);
        u.is_active = false;
        assert!(Session::new(u).require_actor().is_err());
    }

    #[test]
    fn resolved_actor_is_available() {
        let u = User::new("qc-1", "Kiran", "kiran@studio.test", Role::Qc);
        let s = Session::resolve(&Fixed(Some(u)));
        assert_eq!(s.require_actor().unwrap().id, "qc-1");
    }
}
