//! Flash Orchestrator Pallet
//!
//! Borrows from an external lending pool on behalf of a signed caller, forwards the funds to
//! the caller's own callback, and hands repayment back to the pool, all inside one
//! dispatchable. The pool's callback into this pallet is the trust boundary: it is accepted
//! only from the configured pool and only for a borrow this pallet started itself.
//!
//! ## Lifecycle
//!
//! `Idle -> Requested -> AwaitingCallback -> Settled`, or `Rejected` when the pool or the
//! callback refuses. A rejected operation fails the whole dispatch, so nothing of it is
//! observable afterwards, including the borrow.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod adapters;
pub use adapters::FungiblesAdapter;

pub mod types;
pub use types::{
  AssetOps, CallbackRequest, FlashCallback, FlashContext, FlashOperation, FlashPhase, FlashPool,
  FlashReceiver,
};

pub mod weights;
pub use weights::WeightInfo;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub const LOG_TARGET: &str = "runtime::flash-orchestrator";

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId> {
  /// An asset the configured pool can lend, with enough liquidity for `amount`.
  fn setup_flash_asset(amount: primitives::Balance) -> primitives::AssetKind;
  fn fund(asset: primitives::AssetKind, who: &AccountId, amount: primitives::Balance);
}

#[frame::pallet]
pub mod pallet {
  use super::{
    AssetOps, CallbackRequest, FlashCallback, FlashContext, FlashOperation, FlashPhase, FlashPool,
    FlashReceiver, LOG_TARGET, WeightInfo,
  };
  use alloc::vec::Vec;
  use codec::DecodeAll;
  use frame::deps::{
    frame_support::{PalletId, storage::with_storage_layer},
    sp_runtime::traits::AccountIdConversion,
  };
  use frame::prelude::*;
  use primitives::{AssetKind, Balance, CallbackGuard, GuardError};

  pub type FlashOperationOf<T> = FlashOperation<<T as frame_system::Config>::AccountId>;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Asset movements on the orchestrator account
    type Assets: AssetOps<Self::AccountId>;
    /// Lending pool borrowed from
    type Pool: FlashPool<Self::AccountId>;
    /// Callback of the caller receiving the borrowed funds
    type Receiver: FlashReceiver<Self::AccountId>;
    /// The only account allowed to deliver the pool callback
    #[pallet::constant]
    type TrustedPool: Get<Self::AccountId>;
    /// Pallet ID for the borrowing account
    #[pallet::constant]
    type PalletId: Get<PalletId>;
    /// Referral code forwarded with every borrow
    #[pallet::constant]
    type ReferralCode: Get<u16>;
    /// Maximum caller data echoed to the receiver
    #[pallet::constant]
    type MaxUserData: Get<u32>;
    /// Maximum encoded context accepted by the callback dispatchable
    #[pallet::constant]
    type MaxContextLen: Get<u32>;
    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId>;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::storage]
  #[pallet::getter(fn next_operation_id)]
  pub type NextOperationId<T> = StorageValue<_, u64, ValueQuery>;

  /// Present only while a flash operation is in flight.
  #[pallet::storage]
  #[pallet::getter(fn active_operation)]
  pub type ActiveOperation<T: Config> = StorageValue<_, FlashOperationOf<T>, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// Funds reached the caller and repayment was approved to the pool
    RepaymentApproved {
      operation_id: u64,
      pool: T::AccountId,
      amount: Balance,
    },
    /// Flash operation completed and was repaid
    FlashSettled {
      operation_id: u64,
      caller: T::AccountId,
      asset: AssetKind,
      amount: Balance,
      fee: Balance,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Malformed amount or callback context
    InvalidParameters,
    /// Callback did not come from the trusted pool
    UnauthorizedCaller,
    /// Callback belongs to a borrow this pallet did not start
    ForeignInitiator,
    /// Operation state does not allow this step
    InconsistentState,
    /// Pool, asset transfer or receiver callback failed
    ExternalExecutionFailed,
    /// A flash operation is already in flight
    OperationInFlight,
    /// Receiver returned less than principal plus fee
    InsufficientRepayment,
    /// Operation identifiers exhausted
    OperationIdOverflow,
  }

  impl<T: Config> From<GuardError> for Error<T> {
    fn from(err: GuardError) -> Self {
      match err {
        GuardError::UnauthorizedCaller => Error::<T>::UnauthorizedCaller,
        GuardError::ForeignInitiator => Error::<T>::ForeignInitiator,
      }
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Borrow `amount` of `asset` for the caller.
    ///
    /// The caller's [`FlashReceiver`] callback receives the funds with `user_data` and must
    /// return `amount + fee` to the pallet account before it returns.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::flash())]
    pub fn flash(
      origin: OriginFor<T>,
      asset: AssetKind,
      amount: Balance,
      user_data: BoundedVec<u8, T::MaxUserData>,
    ) -> DispatchResult {
      let caller = ensure_signed(origin)?;
      Self::do_flash(caller, asset, amount, user_data.into_inner())
    }

    /// Callback entry for pools that reach the pallet through a signed call.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::execute_operation())]
    pub fn execute_operation(
      origin: OriginFor<T>,
      asset: AssetKind,
      amount: Balance,
      fee: Balance,
      initiator: T::AccountId,
      context: BoundedVec<u8, T::MaxContextLen>,
    ) -> DispatchResult {
      let authority = ensure_signed(origin)?;
      Self::do_execute_operation(CallbackRequest {
        asset,
        amount,
        fee,
        initiator,
        authority,
        context: context.into_inner(),
      })
    }
  }

  impl<T: Config> Pallet<T> {
    /// Account that borrows from the pool and receives its callback
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    pub fn do_flash(
      caller: T::AccountId,
      asset: AssetKind,
      amount: Balance,
      user_data: Vec<u8>,
    ) -> DispatchResult {
      ensure!(
        ActiveOperation::<T>::get().is_none(),
        Error::<T>::OperationInFlight
      );
      ensure!(amount > 0, Error::<T>::InvalidParameters);

      let operation_id = NextOperationId::<T>::get();
      let next = operation_id
        .checked_add(1)
        .ok_or(Error::<T>::OperationIdOverflow)?;
      NextOperationId::<T>::put(next);

      let mut operation = FlashOperation {
        id: operation_id,
        caller: caller.clone(),
        asset,
        amount,
        fee: 0,
        phase: FlashPhase::Idle,
      };
      Self::advance(&mut operation, FlashPhase::Requested)?;

      let context = FlashContext::V1 {
        operation_id,
        caller: caller.clone(),
        user_data,
      }
      .encode();

      Self::advance(&mut operation, FlashPhase::AwaitingCallback)?;
      ActiveOperation::<T>::put(&operation);

      let this = Self::account_id();
      if let Err(err) = T::Pool::borrow(&this, &this, asset, amount, context, T::ReferralCode::get())
      {
        log::warn!(
          target: LOG_TARGET,
          "flash operation {} rejected: {:?}",
          operation_id,
          err
        );
        let mut rejected = ActiveOperation::<T>::take().unwrap_or(operation);
        Self::advance(&mut rejected, FlashPhase::Rejected)?;
        return Err(Error::<T>::ExternalExecutionFailed.into());
      }

      let settled = ActiveOperation::<T>::take().ok_or(Error::<T>::InconsistentState)?;
      ensure!(
        settled.id == operation_id && settled.phase == FlashPhase::Settled,
        Error::<T>::InconsistentState
      );
      // The pool must have consumed the whole approval
      let leftover = T::Assets::allowance(asset, &this, &T::TrustedPool::get());
      if leftover != 0 {
        log::error!(
          target: LOG_TARGET,
          "flash operation {} left an allowance of {} to the pool",
          operation_id,
          leftover
        );
        return Err(Error::<T>::InconsistentState.into());
      }

      Self::deposit_event(Event::FlashSettled {
        operation_id,
        caller,
        asset,
        amount,
        fee: settled.fee,
      });
      Ok(())
    }

    /// Pool callback. Authority and initiator are checked before anything in the request
    /// is decoded or any state is touched.
    pub fn do_execute_operation(request: CallbackRequest<T::AccountId>) -> DispatchResult {
      let this = Self::account_id();
      CallbackGuard::new(T::TrustedPool::get(), this.clone())
        .check(&request.authority, &request.initiator)
        .map_err(|err| {
          log::warn!(
            target: LOG_TARGET,
            "rejected callback from {:?} for initiator {:?}: {:?}",
            request.authority,
            request.initiator,
            err
          );
          Error::<T>::from(err)
        })?;

      let mut operation = ActiveOperation::<T>::get().ok_or(Error::<T>::InconsistentState)?;
      ensure!(
        operation.phase == FlashPhase::AwaitingCallback,
        Error::<T>::InconsistentState
      );

      let FlashContext::V1 {
        operation_id,
        caller,
        user_data,
      } = FlashContext::<T::AccountId>::decode_all(&mut &request.context[..])
        .map_err(|_| Error::<T>::InvalidParameters)?;
      ensure!(
        operation_id == operation.id
          && caller == operation.caller
          && request.asset == operation.asset
          && request.amount == operation.amount,
        Error::<T>::InvalidParameters
      );
      let owed = request
        .amount
        .checked_add(request.fee)
        .ok_or(Error::<T>::InvalidParameters)?;

      // Only what the receiver sends back counts towards repayment
      let required = T::Assets::balance(request.asset, &this)
        .checked_sub(request.amount)
        .and_then(|rest| rest.checked_add(owed))
        .ok_or(Error::<T>::InconsistentState)?;

      T::Assets::transfer(request.asset, &this, &caller, request.amount)
        .map_err(|err| Self::external_failure("forward", err))?;
      T::Receiver::on_flash_loan(&caller, request.asset, request.amount, request.fee, &user_data)
        .map_err(|err| Self::external_failure("receiver", err))?;

      ensure!(
        T::Assets::balance(request.asset, &this) >= required,
        Error::<T>::InsufficientRepayment
      );
      T::Assets::approve(request.asset, &this, &request.authority, owed)
        .map_err(|err| Self::external_failure("approve", err))?;

      operation.fee = request.fee;
      Self::advance(&mut operation, FlashPhase::Settled)?;
      ActiveOperation::<T>::put(&operation);

      Self::deposit_event(Event::RepaymentApproved {
        operation_id,
        pool: request.authority,
        amount: owed,
      });
      Ok(())
    }

    fn advance(operation: &mut FlashOperationOf<T>, next: FlashPhase) -> Result<(), Error<T>> {
      ensure!(
        operation.phase.can_advance_to(next),
        Error::<T>::InconsistentState
      );
      if next.is_terminal() {
        log::debug!(
          target: LOG_TARGET,
          "flash operation {} finished as {:?}",
          operation.id,
          next
        );
      } else {
        log::trace!(
          target: LOG_TARGET,
          "flash operation {}: {:?} -> {:?}",
          operation.id,
          operation.phase,
          next
        );
      }
      operation.phase = next;
      Ok(())
    }

    fn external_failure(step: &str, err: DispatchError) -> Error<T> {
      log::debug!(target: LOG_TARGET, "{} failed: {:?}", step, err);
      Error::<T>::ExternalExecutionFailed
    }
  }

  impl<T: Config> FlashCallback<T::AccountId> for Pallet<T> {
    fn execute_operation(request: CallbackRequest<T::AccountId>) -> DispatchResult {
      with_storage_layer(|| Self::do_execute_operation(request))
    }
  }

  /// Genesis configuration: the pallet account gets a provider reference so it never needs ED
  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    #[serde(skip)]
    pub _marker: core::marker::PhantomData<T>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      // Borrowing account holds funds only transiently, keep it alive regardless
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
    }
  }
}
