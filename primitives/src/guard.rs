//! Caller authorization for inbound callbacks and notifications.
//!
//! Both checks compare identities only. They never look at payloads, so they can run
//! before anything caller-supplied is decoded.

/// Reason an inbound call was refused
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GuardError {
  /// The call did not come from the single trusted counter-party
  UnauthorizedCaller,
  /// The call refers to an operation some other account started
  ForeignInitiator,
}

/// Accept `caller` only if it is exactly `trusted`.
pub fn ensure_trusted<AccountId: PartialEq>(
  caller: &AccountId,
  trusted: &AccountId,
) -> Result<(), GuardError> {
  if caller == trusted {
    Ok(())
  } else {
    Err(GuardError::UnauthorizedCaller)
  }
}

/// Trust boundary of a callback receiver.
///
/// `trusted` is the only account allowed to deliver the callback and `this` is the
/// account the receiver borrows as.
pub struct CallbackGuard<AccountId> {
  pub trusted: AccountId,
  pub this: AccountId,
}

impl<AccountId: PartialEq> CallbackGuard<AccountId> {
  pub fn new(trusted: AccountId, this: AccountId) -> Self {
    Self { trusted, this }
  }

  /// Authority is checked first, whatever the initiator.
  pub fn check(&self, authority: &AccountId, initiator: &AccountId) -> Result<(), GuardError> {
    ensure_trusted(authority, &self.trusted)?;
    if initiator != &self.this {
      return Err(GuardError::ForeignInitiator);
    }
    Ok(())
  }
}
