//! Ownership trait for user-owned resources.
//!
//! Tiers are owned by the provider who publishes them, subscriptions by the
//! subscriber who pays for them. Handlers call `check_ownership` with the
//! authenticated caller before mutating either.

use super::{DomainError, ErrorCode, UserId};

/// Trait for aggregates that have a single owner.
pub trait OwnedByUser {
    /// Returns the ID of the user who owns this resource.
    fn owner_id(&self) -> &UserId;

    /// Returns `true` if `user_id` matches `owner_id()`.
    fn is_owner(&self, user_id: &UserId) -> bool {
        self.owner_id() == user_id
    }

    /// Validates ownership, returning a `Forbidden` error if the user is not the owner.
    fn check_ownership(&self, user_id: &UserId) -> Result<(), DomainError> {
        if self.is_owner(user_id) {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::Forbidden,
                "User does not own this resource",
            )
            .with_detail("owner_id", self.owner_id().to_string())
            .with_detail("requested_by", user_id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Listing {
        owner: UserId,
    }

    impl OwnedByUser for Listing {
        fn owner_id(&self) -> &UserId {
            &self.owner
        }
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn check_ownership_succeeds_for_owner() {
        let listing = Listing { owner: user("provider-1") };
        assert!(listing.check_ownership(&user("provider-1")).is_ok());
    }

    #[test]
    fn check_ownership_error_includes_details() {
        let listing = Listing { owner: user("provider-1") };

        let err = listing.check_ownership(&user("intruder")).unwrap_err();

        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(err.details.get("owner_id"), Some(&"provider-1".to_string()));
        assert_eq!(err.details.get("requested_by"), Some(&"intruder".to_string()));
    }
}
