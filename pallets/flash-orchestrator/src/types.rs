//! Collaborator traits and state types of the flash orchestrator.

use alloc::vec::Vec;
use frame::prelude::*;
use primitives::{AssetKind, Balance};

/// Asset movements the orchestrator performs on its own account.
pub trait AssetOps<AccountId> {
  fn transfer(
    asset: AssetKind,
    from: &AccountId,
    to: &AccountId,
    amount: Balance,
  ) -> Result<(), DispatchError>;

  /// Move `amount` from `owner` to `to` using the allowance granted to `spender`.
  fn transfer_from(
    asset: AssetKind,
    owner: &AccountId,
    spender: &AccountId,
    to: &AccountId,
    amount: Balance,
  ) -> Result<(), DispatchError>;

  /// Set the allowance of `spender` over `owner`'s funds to exactly `amount`.
  fn approve(
    asset: AssetKind,
    owner: &AccountId,
    spender: &AccountId,
    amount: Balance,
  ) -> Result<(), DispatchError>;

  fn allowance(asset: AssetKind, owner: &AccountId, spender: &AccountId) -> Balance;

  fn balance(asset: AssetKind, who: &AccountId) -> Balance;
}

/// External lending pool offering single-asset flash borrows.
///
/// While `borrow` runs, the pool transfers `amount` to `receiver`, calls back into
/// [`FlashCallback::execute_operation`] with `initiator` and the opaque `context`, and
/// finally pulls `amount + fee` from `receiver` using the allowance granted in the callback.
pub trait FlashPool<AccountId> {
  fn borrow(
    initiator: &AccountId,
    receiver: &AccountId,
    asset: AssetKind,
    amount: Balance,
    context: Vec<u8>,
    referral: u16,
  ) -> Result<(), DispatchError>;
}

/// Entry point the pool calls back into.
pub trait FlashCallback<AccountId> {
  fn execute_operation(request: CallbackRequest<AccountId>) -> Result<(), DispatchError>;
}

/// Callback of the account that asked for the flash operation.
///
/// Invoked after the borrowed funds reached `receiver`. Before returning, the receiver
/// must send `amount + fee` back to the orchestrator account.
pub trait FlashReceiver<AccountId> {
  fn on_flash_loan(
    receiver: &AccountId,
    asset: AssetKind,
    amount: Balance,
    fee: Balance,
    user_data: &[u8],
  ) -> Result<(), DispatchError>;
}

impl<AccountId> FlashPool<AccountId> for () {
  fn borrow(
    _: &AccountId,
    _: &AccountId,
    _: AssetKind,
    _: Balance,
    _: Vec<u8>,
    _: u16,
  ) -> Result<(), DispatchError> {
    Err(DispatchError::Other("FlashPool not configured"))
  }
}

impl<AccountId> FlashReceiver<AccountId> for () {
  fn on_flash_loan(_: &AccountId, _: AssetKind, _: Balance, _: Balance, _: &[u8]) -> Result<(), DispatchError> {
    Err(DispatchError::Other("FlashReceiver not configured"))
  }
}

/// Everything the pool hands back to the borrower mid-operation
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct CallbackRequest<AccountId> {
  pub asset: AssetKind,
  pub amount: Balance,
  pub fee: Balance,
  /// Account that started the borrow
  pub initiator: AccountId,
  /// Account delivering the callback
  pub authority: AccountId,
  pub context: Vec<u8>,
}

/// Payload echoed through the pool.
///
/// The pool does not preserve who asked for the operation, so the context carries it.
/// Variants are versioned through their codec index.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub enum FlashContext<AccountId> {
  #[codec(index = 1)]
  V1 {
    operation_id: u64,
    caller: AccountId,
    user_data: Vec<u8>,
  },
}

#[derive(
  Clone,
  Copy,
  Debug,
  Default,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub enum FlashPhase {
  #[default]
  Idle,
  Requested,
  AwaitingCallback,
  Settled,
  Rejected,
}

impl FlashPhase {
  pub fn can_advance_to(self, next: FlashPhase) -> bool {
    use FlashPhase::*;
    matches!(
      (self, next),
      (Idle, Requested)
        | (Requested, AwaitingCallback)
        | (Requested, Rejected)
        | (AwaitingCallback, Settled)
        | (AwaitingCallback, Rejected)
    )
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, FlashPhase::Settled | FlashPhase::Rejected)
  }
}

/// The single in-flight flash operation
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub struct FlashOperation<AccountId> {
  pub id: u64,
  pub caller: AccountId,
  pub asset: AssetKind,
  pub amount: Balance,
  pub fee: Balance,
  pub phase: FlashPhase,
}
