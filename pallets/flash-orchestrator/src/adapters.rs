//! `AssetOps` over the runtime's native currency and multi-asset pallet.
//!
//! Native funds can be moved but not delegated: the native currency exposes no
//! approvals, so flash operations on `AssetKind::Native` fail at repayment approval.

use crate::types::AssetOps;
use core::marker::PhantomData;
use frame::deps::frame_support::traits::{
  fungible::{Inspect as NativeInspect, Mutate as NativeMutate},
  fungibles::{
    Inspect as FungiblesInspect, Mutate as FungiblesMutate,
    approvals::{Inspect as ApprovalInspect, Mutate as ApprovalMutate},
  },
  tokens::Preservation,
};
use frame::prelude::*;
use primitives::{AssetInspector, AssetKind, Balance};

const NATIVE_APPROVALS_UNSUPPORTED: DispatchError =
  DispatchError::Other("native currency has no approvals");

pub struct FungiblesAdapter<Native, Assets>(PhantomData<(Native, Assets)>);

impl<AccountId: Eq, Native, Assets> AssetOps<AccountId> for FungiblesAdapter<Native, Assets>
where
  Native: NativeMutate<AccountId, Balance = Balance>,
  Assets: FungiblesMutate<AccountId, AssetId = u32, Balance = Balance>
    + ApprovalMutate<AccountId>,
{
  fn transfer(
    asset: AssetKind,
    from: &AccountId,
    to: &AccountId,
    amount: Balance,
  ) -> Result<(), DispatchError> {
    match asset {
      AssetKind::Native => {
        <Native as NativeMutate<AccountId>>::transfer(from, to, amount, Preservation::Expendable)?;
      }
      AssetKind::Local(id) | AssetKind::Foreign(id) => {
        <Assets as FungiblesMutate<AccountId>>::transfer(
          id,
          from,
          to,
          amount,
          Preservation::Expendable,
        )?;
      }
    }
    Ok(())
  }

  fn transfer_from(
    asset: AssetKind,
    owner: &AccountId,
    spender: &AccountId,
    to: &AccountId,
    amount: Balance,
  ) -> Result<(), DispatchError> {
    match asset {
      AssetKind::Native => Err(NATIVE_APPROVALS_UNSUPPORTED),
      AssetKind::Local(id) | AssetKind::Foreign(id) => {
        <Assets as ApprovalMutate<AccountId>>::transfer_from(id, owner, spender, to, amount)
      }
    }
  }

  fn approve(
    asset: AssetKind,
    owner: &AccountId,
    spender: &AccountId,
    amount: Balance,
  ) -> Result<(), DispatchError> {
    let id = asset.local_id().ok_or(NATIVE_APPROVALS_UNSUPPORTED)?;
    // Approvals only accumulate, so top up to the target
    let current = <Assets as ApprovalInspect<AccountId>>::allowance(id, owner, spender);
    if current > amount {
      return Err(DispatchError::Other("allowance above target"));
    }
    let missing = amount - current;
    if missing > 0 {
      <Assets as ApprovalMutate<AccountId>>::approve(id, owner, spender, missing)?;
    }
    Ok(())
  }

  fn allowance(asset: AssetKind, owner: &AccountId, spender: &AccountId) -> Balance {
    match asset {
      AssetKind::Native => 0,
      AssetKind::Local(id) | AssetKind::Foreign(id) => {
        <Assets as ApprovalInspect<AccountId>>::allowance(id, owner, spender)
      }
    }
  }

  fn balance(asset: AssetKind, who: &AccountId) -> Balance {
    match asset {
      AssetKind::Native => <Native as NativeInspect<AccountId>>::balance(who),
      AssetKind::Local(id) | AssetKind::Foreign(id) => {
        <Assets as FungiblesInspect<AccountId>>::balance(id, who)
      }
    }
  }
}
