//! Batch Executor Pallet
//!
//! Assembles ordered liquidity actions (burn, mint, modify, settle, take, sweep) and submits
//! them to an external position manager in a single call. Before anything leaves the
//! pallet the batch must be closed: every currency a position action touches has to be
//! settled or taken by a later action. Expected per-asset deltas are predicted up front and
//! the manager's reported result must stay within them, otherwise the whole dispatch is
//! reverted.
//!
//! Besides the raw `execute` entry point the pallet compiles common workflows into batches
//! (`reposition`, `mint_position`, `increase_liquidity`, `decrease_liquidity`,
//! `burn_position`) for the owner of the position.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod accountant;
pub mod actions;
pub mod types;
pub mod weights;

pub use accountant::{DeltaMap, SettlementAccountant, reconcile};
pub use actions::{
  Action, ActionKind, ActionParams, Batch, BatchBuilder, BatchError, decode_batch, encode_batch,
};
pub use types::{BatchProcessor, BatchReceipt};
pub use weights::WeightInfo;

pub const LOG_TARGET: &str = "runtime::batch-executor";

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId> {
  /// Pool every benchmark batch operates in
  fn pool() -> primitives::PoolKey;
  /// Create a position in [`Self::pool`] owned by `owner`.
  fn create_position(owner: &AccountId, liquidity: primitives::Liquidity) -> primitives::PositionId;
  /// Give `who` enough of both pool currencies to pay for `amount`.
  fn fund(who: &AccountId, amount: primitives::Balance);
}

#[frame::pallet]
pub mod pallet {
  use super::{
    Action, ActionKind, ActionParams, Batch, BatchBuilder, BatchError, BatchProcessor,
    BatchReceipt, LOG_TARGET, SettlementAccountant, WeightInfo, encode_batch, reconcile,
  };
  use alloc::vec::Vec;
  use frame::prelude::*;
  use primitives::{
    AssetInspector, AssetKind, Balance, Liquidity, PoolKey, PositionId, PositionInfo,
    PositionInspect,
  };

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// External position manager that runs the encoded batches
    type Processor: BatchProcessor<Self::AccountId, BlockNumberFor<Self>>;
    /// Upper bound on actions in one batch
    #[pallet::constant]
    type MaxActions: Get<u32>;
    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId>;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  /// Id assigned to the next successfully executed batch
  #[pallet::storage]
  #[pallet::getter(fn next_batch_id)]
  pub type NextBatchId<T: Config> = StorageValue<_, u64, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// Batch ran to completion within its predicted bounds
    BatchExecuted {
      batch_id: u64,
      who: T::AccountId,
      actions: u32,
      minted: Vec<PositionId>,
    },
    /// Realized per-asset delta next to its predicted bound
    DeltaRealized {
      batch_id: u64,
      asset: AssetKind,
      predicted: i128,
      realized: i128,
    },
    /// Liquidity moved from one position into a freshly minted one
    Repositioned {
      who: T::AccountId,
      from: PositionId,
      to: Option<PositionId>,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Malformed action, empty batch or overflowing amounts
    InvalidParameters,
    /// A touched currency is not closed by a later settlement action
    UnsettledCurrency,
    /// Batch deadline has passed
    DeadlineExpired,
    /// The position manager rejected the batch
    ExternalExecutionFailed,
    /// Referenced position does not exist
    UnknownPosition,
    /// Manager's reported result falls outside the predicted bounds
    InconsistentState,
    /// Batch holds more than `MaxActions` actions
    TooManyActions,
    /// Caller does not own the position
    NotPositionOwner,
    /// Batch id counter exhausted
    BatchIdOverflow,
  }

  impl<T: Config> From<BatchError> for Error<T> {
    fn from(err: BatchError) -> Self {
      match err {
        BatchError::InvalidParameters => Error::<T>::InvalidParameters,
        BatchError::UnsettledCurrency => Error::<T>::UnsettledCurrency,
        BatchError::UnknownPosition => Error::<T>::UnknownPosition,
        BatchError::InconsistentState => Error::<T>::InconsistentState,
        BatchError::TooManyActions => Error::<T>::TooManyActions,
      }
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Submit an arbitrary action list as one atomic batch.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::execute(actions.len() as u32))]
    pub fn execute(
      origin: OriginFor<T>,
      actions: BoundedVec<Action<T::AccountId>, T::MaxActions>,
      deadline: BlockNumberFor<T>,
      native_value: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_execute(
        &who,
        Batch {
          actions: actions.into_inner(),
          deadline,
          native_value,
        },
      )?;
      Ok(())
    }

    /// Move the whole of `position` into a new tick range.
    ///
    /// Burns the position, mints a new one from the released amounts and returns the
    /// remainder to the caller.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::reposition())]
    pub fn reposition(
      origin: OriginFor<T>,
      position: PositionId,
      tick_lower: i32,
      tick_upper: i32,
      amounts_min: (Balance, Balance),
      amounts_max: (Balance, Balance),
      deadline: BlockNumberFor<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let pool = Self::owned_pool(&who, position)?;

      let mut builder = BatchBuilder::new(T::MaxActions::get());
      builder
        .add_action(ActionKind::BurnPosition, ActionParams::BurnPosition {
          position,
          amount0_min: amounts_min.0,
          amount1_min: amounts_min.1,
        })
        .map_err(Error::<T>::from)?
        .add_action(ActionKind::MintFromDeltas, ActionParams::MintFromDeltas {
          pool,
          range: PositionInfo {
            tick_lower,
            tick_upper,
          },
          amount0_max: amounts_max.0,
          amount1_max: amounts_max.1,
          owner: who.clone(),
        })
        .map_err(Error::<T>::from)?;
      Self::take_pair(&mut builder, &pool, &who)?;

      let receipt = Self::do_execute(&who, builder.finish(deadline, 0))?;
      Self::deposit_event(Event::Repositioned {
        who,
        from: position,
        to: receipt.minted.first().copied(),
      });
      Ok(())
    }

    /// Mint a new position, paying at most `amounts_max` from the caller.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::mint_position())]
    pub fn mint_position(
      origin: OriginFor<T>,
      pool: PoolKey,
      tick_lower: i32,
      tick_upper: i32,
      liquidity: Liquidity,
      amounts_max: (Balance, Balance),
      deadline: BlockNumberFor<T>,
      native_value: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;

      let mut builder = BatchBuilder::new(T::MaxActions::get());
      builder
        .add_action(ActionKind::MintPosition, ActionParams::MintPosition {
          pool,
          range: PositionInfo {
            tick_lower,
            tick_upper,
          },
          liquidity,
          amount0_max: amounts_max.0,
          amount1_max: amounts_max.1,
          owner: who.clone(),
        })
        .map_err(Error::<T>::from)?;
      Self::settle_pair(&mut builder, &pool, &who)?;

      Self::do_execute(&who, builder.finish(deadline, native_value))?;
      Ok(())
    }

    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::increase_liquidity())]
    pub fn increase_liquidity(
      origin: OriginFor<T>,
      position: PositionId,
      liquidity: Liquidity,
      amounts_max: (Balance, Balance),
      deadline: BlockNumberFor<T>,
      native_value: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let pool = Self::owned_pool(&who, position)?;

      let mut builder = BatchBuilder::new(T::MaxActions::get());
      builder
        .add_action(ActionKind::IncreaseLiquidity, ActionParams::IncreaseLiquidity {
          position,
          liquidity,
          amount0_max: amounts_max.0,
          amount1_max: amounts_max.1,
        })
        .map_err(Error::<T>::from)?;
      Self::settle_pair(&mut builder, &pool, &who)?;

      Self::do_execute(&who, builder.finish(deadline, native_value))?;
      Ok(())
    }

    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::decrease_liquidity())]
    pub fn decrease_liquidity(
      origin: OriginFor<T>,
      position: PositionId,
      liquidity: Liquidity,
      amounts_min: (Balance, Balance),
      deadline: BlockNumberFor<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let pool = Self::owned_pool(&who, position)?;

      let mut builder = BatchBuilder::new(T::MaxActions::get());
      builder
        .add_action(ActionKind::DecreaseLiquidity, ActionParams::DecreaseLiquidity {
          position,
          liquidity,
          amount0_min: amounts_min.0,
          amount1_min: amounts_min.1,
        })
        .map_err(Error::<T>::from)?;
      Self::take_pair(&mut builder, &pool, &who)?;

      Self::do_execute(&who, builder.finish(deadline, 0))?;
      Ok(())
    }

    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::burn_position())]
    pub fn burn_position(
      origin: OriginFor<T>,
      position: PositionId,
      amounts_min: (Balance, Balance),
      deadline: BlockNumberFor<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let pool = Self::owned_pool(&who, position)?;

      let mut builder = BatchBuilder::new(T::MaxActions::get());
      builder
        .add_action(ActionKind::BurnPosition, ActionParams::BurnPosition {
          position,
          amount0_min: amounts_min.0,
          amount1_min: amounts_min.1,
        })
        .map_err(Error::<T>::from)?;
      Self::take_pair(&mut builder, &pool, &who)?;

      Self::do_execute(&who, builder.finish(deadline, 0))?;
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Validate, check closure, predict, submit once and reconcile.
    ///
    /// Nothing reaches the processor unless the batch is non-empty, within its deadline,
    /// well formed and closed.
    pub fn do_execute(
      who: &T::AccountId,
      batch: Batch<T::AccountId, BlockNumberFor<T>>,
    ) -> Result<BatchReceipt, DispatchError> {
      ensure!(!batch.actions.is_empty(), Error::<T>::InvalidParameters);
      ensure!(
        batch.actions.len() <= T::MaxActions::get() as usize,
        Error::<T>::TooManyActions
      );
      ensure!(
        frame_system::Pallet::<T>::block_number() <= batch.deadline,
        Error::<T>::DeadlineExpired
      );
      for action in batch.actions.iter() {
        action.validate().map_err(Error::<T>::from)?;
      }

      let accountant = SettlementAccountant::new(T::Processor::next_position_id(), |id| {
        T::Processor::pool_and_position(id).map(|(pool, _)| pool)
      });
      accountant
        .ensure_closed(&batch.actions)
        .and_then(|()| accountant.ensure_native_returned(&batch.actions, batch.native_value))
        .map_err(Error::<T>::from)?;
      let predicted = accountant
        .predict_deltas(&batch.actions)
        .map_err(Error::<T>::from)?;

      let batch_id = NextBatchId::<T>::get();
      let next = batch_id.checked_add(1).ok_or(Error::<T>::BatchIdOverflow)?;

      let receipt = T::Processor::execute_batch(
        who,
        encode_batch(&batch.actions),
        batch.native_value,
        batch.deadline,
      )
      .map_err(|err| {
        log::warn!(
          target: LOG_TARGET,
          "batch {} with {} actions rejected by processor: {:?}",
          batch_id,
          batch.actions.len(),
          err
        );
        Error::<T>::ExternalExecutionFailed
      })?;

      if let Err(err) = reconcile(&predicted, &receipt.deltas) {
        log::error!(
          target: LOG_TARGET,
          "batch {} realized {:?} outside predicted {:?}",
          batch_id,
          receipt.deltas,
          predicted
        );
        return Err(Error::<T>::from(err).into());
      }

      NextBatchId::<T>::put(next);
      for (asset, bound) in predicted.iter() {
        let realized = receipt
          .deltas
          .iter()
          .find(|(a, _)| a == asset)
          .map(|(_, delta)| *delta)
          .unwrap_or(0);
        Self::deposit_event(Event::DeltaRealized {
          batch_id,
          asset: *asset,
          predicted: *bound,
          realized,
        });
      }
      log::debug!(
        target: LOG_TARGET,
        "batch {} executed for {:?}, minted {:?}",
        batch_id,
        who,
        receipt.minted
      );
      Self::deposit_event(Event::BatchExecuted {
        batch_id,
        who: who.clone(),
        actions: batch.actions.len() as u32,
        minted: receipt.minted.clone(),
      });
      Ok(receipt)
    }

    /// Pool of `position`, provided `who` owns it.
    pub fn owned_pool(who: &T::AccountId, position: PositionId) -> Result<PoolKey, DispatchError> {
      let owner = T::Processor::owner_of(position).ok_or(Error::<T>::UnknownPosition)?;
      ensure!(&owner == who, Error::<T>::NotPositionOwner);
      let (pool, _) =
        T::Processor::pool_and_position(position).ok_or(Error::<T>::UnknownPosition)?;
      Ok(pool)
    }

    fn take_pair(
      builder: &mut BatchBuilder<T::AccountId>,
      pool: &PoolKey,
      recipient: &T::AccountId,
    ) -> DispatchResult {
      builder
        .add_action(ActionKind::TakePair, ActionParams::TakePair {
          currency0: pool.currency0,
          currency1: pool.currency1,
          recipient: recipient.clone(),
        })
        .map_err(Error::<T>::from)?;
      Ok(())
    }

    /// Pay both currencies; a native leg also sweeps unspent native value back.
    fn settle_pair(
      builder: &mut BatchBuilder<T::AccountId>,
      pool: &PoolKey,
      payer: &T::AccountId,
    ) -> DispatchResult {
      builder
        .add_action(ActionKind::SettlePair, ActionParams::SettlePair {
          currency0: pool.currency0,
          currency1: pool.currency1,
        })
        .map_err(Error::<T>::from)?;
      if pool.currency0.is_native() {
        builder
          .add_action(ActionKind::Sweep, ActionParams::Sweep {
            currency: AssetKind::Native,
            recipient: payer.clone(),
          })
          .map_err(Error::<T>::from)?;
      }
      Ok(())
    }
  }
}
