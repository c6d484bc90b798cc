//! Position Ledger Pallet
//!
//! Mirrors the lifecycle of positions owned by an external position manager into a
//! per-(pool, owner) liquidity table. The manager pushes four notifications
//! (subscribe, unsubscribe, modify liquidity, burn); each is accepted only from the
//! configured trusted manager account and applied atomically.
//!
//! The balance table is derived state: for every `(pool, owner)` it always equals the sum
//! of liquidity across that owner's tracked records in that pool, and it never goes
//! negative. Any notification that would break this fails with `InconsistentState`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

pub const LOG_TARGET: &str = "runtime::position-ledger";

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId> {
  /// Make `id` queryable on the position manager with the given owner and liquidity.
  fn create_position(id: primitives::PositionId, owner: &AccountId, liquidity: primitives::Liquidity);
}

/// Entry points used by an in-runtime position manager to push lifecycle notifications.
///
/// `caller` is the account the manager acts as. Each call is applied in its own
/// storage layer so a failed notification leaves no trace.
pub trait PositionSubscriber<AccountId> {
  fn on_subscribe(
    caller: &AccountId,
    position: primitives::PositionId,
  ) -> polkadot_sdk::sp_runtime::DispatchResult;

  fn on_unsubscribe(
    caller: &AccountId,
    position: primitives::PositionId,
  ) -> polkadot_sdk::sp_runtime::DispatchResult;

  fn on_modify_liquidity(
    caller: &AccountId,
    position: primitives::PositionId,
    liquidity_change: i128,
  ) -> polkadot_sdk::sp_runtime::DispatchResult;

  fn on_burn(
    caller: &AccountId,
    position: primitives::PositionId,
    owner: &AccountId,
    liquidity: primitives::Liquidity,
  ) -> polkadot_sdk::sp_runtime::DispatchResult;
}

impl<AccountId> PositionSubscriber<AccountId> for () {
  fn on_subscribe(_: &AccountId, _: primitives::PositionId) -> polkadot_sdk::sp_runtime::DispatchResult {
    Ok(())
  }

  fn on_unsubscribe(
    _: &AccountId,
    _: primitives::PositionId,
  ) -> polkadot_sdk::sp_runtime::DispatchResult {
    Ok(())
  }

  fn on_modify_liquidity(
    _: &AccountId,
    _: primitives::PositionId,
    _: i128,
  ) -> polkadot_sdk::sp_runtime::DispatchResult {
    Ok(())
  }

  fn on_burn(
    _: &AccountId,
    _: primitives::PositionId,
    _: &AccountId,
    _: primitives::Liquidity,
  ) -> polkadot_sdk::sp_runtime::DispatchResult {
    Ok(())
  }
}

#[frame::pallet]
pub mod pallet {
  use super::{LOG_TARGET, PositionSubscriber, WeightInfo};
  use alloc::collections::BTreeMap;
  use frame::deps::{
    frame_support::{PalletId, storage::with_storage_layer},
    sp_runtime::traits::{AccountIdConversion, Hash as HashT},
  };
  use frame::prelude::*;
  use primitives::{GuardError, Liquidity, PoolKey, PositionId, PositionInspect, ensure_trusted};

  pub type PoolIdOf<T> = <T as frame_system::Config>::Hash;

  /// Cached view of one subscribed position
  #[derive(
    Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
  )]
  pub struct PositionRecord<PoolId, AccountId> {
    pub pool_id: PoolId,
    pub owner: AccountId,
    pub liquidity: Liquidity,
  }

  pub type PositionRecordOf<T> = PositionRecord<PoolIdOf<T>, <T as frame_system::Config>::AccountId>;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Read access to the external position manager
    type PositionManager: PositionInspect<Self::AccountId>;
    /// The only account allowed to deliver lifecycle notifications
    #[pallet::constant]
    type TrustedManager: Get<Self::AccountId>;
    /// Pallet ID for the subscriber account registered with the manager
    #[pallet::constant]
    type PalletId: Get<PalletId>;
    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId>;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::storage]
  #[pallet::getter(fn tracked_position)]
  pub type TrackedPositions<T: Config> =
    StorageMap<_, Blake2_128Concat, PositionId, PositionRecordOf<T>, OptionQuery>;

  /// Mirrored liquidity per pool and owner. Zero balances are removed.
  #[pallet::storage]
  #[pallet::getter(fn liquidity_balance)]
  pub type LiquidityBalances<T: Config> = StorageDoubleMap<
    _,
    Blake2_128Concat,
    PoolIdOf<T>,
    Blake2_128Concat,
    T::AccountId,
    Liquidity,
    ValueQuery,
  >;

  #[pallet::hooks]
  impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
    #[cfg(feature = "try-runtime")]
    fn try_state(_n: BlockNumberFor<T>) -> Result<(), frame::deps::sp_runtime::TryRuntimeError> {
      Self::do_try_state()
    }
  }

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// Position started being tracked
    Subscribed {
      position: PositionId,
      pool_id: PoolIdOf<T>,
      owner: T::AccountId,
      liquidity: Liquidity,
    },
    /// Position stopped being tracked at the manager's request
    Unsubscribed {
      position: PositionId,
      pool_id: PoolIdOf<T>,
      owner: T::AccountId,
      liquidity: Liquidity,
    },
    /// Tracked liquidity grew by `delta`
    LiquidityIncreased {
      position: PositionId,
      pool_id: PoolIdOf<T>,
      owner: T::AccountId,
      delta: Liquidity,
      liquidity: Liquidity,
    },
    /// A non-positive modification dropped the whole record
    TrackingCleared {
      position: PositionId,
      pool_id: PoolIdOf<T>,
      owner: T::AccountId,
      liquidity: Liquidity,
    },
    /// Position was destroyed by the manager
    Burned {
      position: PositionId,
      pool_id: PoolIdOf<T>,
      owner: T::AccountId,
      liquidity: Liquidity,
    },
    /// Untracked position picked up again from the manager's current state
    Resynced {
      position: PositionId,
      pool_id: PoolIdOf<T>,
      owner: T::AccountId,
      liquidity: Liquidity,
    },
    /// Record replaced by the manager's authoritative state
    Reconciled {
      position: PositionId,
      previous: Option<Liquidity>,
      current: Option<Liquidity>,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Notification did not come from the trusted position manager
    UnauthorizedCaller,
    /// Position manager does not know the position
    UnknownPosition,
    /// Notification contradicts the tracked state
    InconsistentState,
    /// Mirrored balance would exceed the liquidity range
    BalanceOverflow,
  }

  impl<T: Config> From<GuardError> for Error<T> {
    fn from(err: GuardError) -> Self {
      match err {
        GuardError::UnauthorizedCaller | GuardError::ForeignInitiator => Error::<T>::UnauthorizedCaller,
      }
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::notify_subscribe())]
    pub fn notify_subscribe(origin: OriginFor<T>, position: PositionId) -> DispatchResult {
      let caller = ensure_signed(origin)?;
      Self::do_subscribe(&caller, position)
    }

    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::notify_unsubscribe())]
    pub fn notify_unsubscribe(origin: OriginFor<T>, position: PositionId) -> DispatchResult {
      let caller = ensure_signed(origin)?;
      Self::do_unsubscribe(&caller, position)
    }

    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::notify_modify_liquidity())]
    pub fn notify_modify_liquidity(
      origin: OriginFor<T>,
      position: PositionId,
      liquidity_change: i128,
    ) -> DispatchResult {
      let caller = ensure_signed(origin)?;
      Self::do_modify_liquidity(&caller, position, liquidity_change)
    }

    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::notify_burn())]
    pub fn notify_burn(
      origin: OriginFor<T>,
      position: PositionId,
      owner: T::AccountId,
      liquidity: Liquidity,
    ) -> DispatchResult {
      let caller = ensure_signed(origin)?;
      Self::do_burn(&caller, position, &owner, liquidity)
    }

    /// Replace the cached record for `position` with the manager's current state.
    ///
    /// Permissionless: the result only depends on the manager's answers. If the ledger is
    /// no longer the position's subscriber the record is dropped instead.
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::reconcile())]
    pub fn reconcile(origin: OriginFor<T>, position: PositionId) -> DispatchResult {
      ensure_signed(origin)?;
      Self::do_reconcile(position)
    }
  }

  impl<T: Config> Pallet<T> {
    /// Account registered with the manager as the notification subscriber
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    pub fn pool_id(key: &PoolKey) -> PoolIdOf<T> {
      T::Hashing::hash_of(key)
    }

    pub fn do_subscribe(caller: &T::AccountId, position: PositionId) -> DispatchResult {
      Self::ensure_manager(caller)?;
      ensure!(
        !TrackedPositions::<T>::contains_key(position),
        Error::<T>::InconsistentState
      );
      let record = Self::snapshot(position)?;
      Self::credit(&record.pool_id, &record.owner, record.liquidity)?;
      TrackedPositions::<T>::insert(position, &record);
      Self::deposit_event(Event::Subscribed {
        position,
        pool_id: record.pool_id,
        owner: record.owner,
        liquidity: record.liquidity,
      });
      Ok(())
    }

    pub fn do_unsubscribe(caller: &T::AccountId, position: PositionId) -> DispatchResult {
      Self::ensure_manager(caller)?;
      let record = TrackedPositions::<T>::get(position).ok_or(Error::<T>::InconsistentState)?;
      let (key, _) =
        T::PositionManager::pool_and_position(position).ok_or(Error::<T>::UnknownPosition)?;
      ensure!(
        Self::pool_id(&key) == record.pool_id,
        Error::<T>::InconsistentState
      );
      Self::debit(&record.pool_id, &record.owner, record.liquidity)?;
      TrackedPositions::<T>::remove(position);
      Self::deposit_event(Event::Unsubscribed {
        position,
        pool_id: record.pool_id,
        owner: record.owner,
        liquidity: record.liquidity,
      });
      Ok(())
    }

    /// Positive changes are credited. Anything else clears the record in full, since the
    /// notification does not say whether liquidity remains.
    pub fn do_modify_liquidity(
      caller: &T::AccountId,
      position: PositionId,
      liquidity_change: i128,
    ) -> DispatchResult {
      Self::ensure_manager(caller)?;
      let Some(mut record) = TrackedPositions::<T>::get(position) else {
        if liquidity_change > 0 {
          return Self::resync(position);
        }
        log::debug!(
          target: LOG_TARGET,
          "ignoring change {} for untracked position {}",
          liquidity_change,
          position
        );
        return Ok(());
      };

      if liquidity_change > 0 {
        let delta = liquidity_change.unsigned_abs();
        record.liquidity = record
          .liquidity
          .checked_add(delta)
          .ok_or(Error::<T>::BalanceOverflow)?;
        Self::credit(&record.pool_id, &record.owner, delta)?;
        TrackedPositions::<T>::insert(position, &record);
        Self::deposit_event(Event::LiquidityIncreased {
          position,
          pool_id: record.pool_id,
          owner: record.owner,
          delta,
          liquidity: record.liquidity,
        });
      } else {
        Self::debit(&record.pool_id, &record.owner, record.liquidity)?;
        TrackedPositions::<T>::remove(position);
        if liquidity_change.unsigned_abs() != record.liquidity {
          log::debug!(
            target: LOG_TARGET,
            "position {} cleared with change {} against {} tracked",
            position,
            liquidity_change,
            record.liquidity
          );
        }
        Self::deposit_event(Event::TrackingCleared {
          position,
          pool_id: record.pool_id,
          owner: record.owner,
          liquidity: record.liquidity,
        });
      }
      Ok(())
    }

    /// The position is already gone on the manager side, so only the cached record is used.
    pub fn do_burn(
      caller: &T::AccountId,
      position: PositionId,
      owner: &T::AccountId,
      liquidity: Liquidity,
    ) -> DispatchResult {
      Self::ensure_manager(caller)?;
      let Some(record) = TrackedPositions::<T>::get(position) else {
        log::debug!(target: LOG_TARGET, "burn of untracked position {}", position);
        return Ok(());
      };
      ensure!(&record.owner == owner, Error::<T>::InconsistentState);
      if liquidity != record.liquidity {
        log::debug!(
          target: LOG_TARGET,
          "burn of position {} reports {} but {} is tracked",
          position,
          liquidity,
          record.liquidity
        );
      }
      Self::debit(&record.pool_id, &record.owner, record.liquidity)?;
      TrackedPositions::<T>::remove(position);
      Self::deposit_event(Event::Burned {
        position,
        pool_id: record.pool_id,
        owner: record.owner,
        liquidity: record.liquidity,
      });
      Ok(())
    }

    pub fn do_reconcile(position: PositionId) -> DispatchResult {
      let previous = TrackedPositions::<T>::get(position);
      let current = if T::PositionManager::subscriber_of(position) == Some(Self::account_id()) {
        Some(Self::snapshot(position)?)
      } else {
        None
      };
      ensure!(
        previous.is_some() || current.is_some(),
        Error::<T>::UnknownPosition
      );

      if let Some(record) = &previous {
        Self::debit(&record.pool_id, &record.owner, record.liquidity)?;
      }
      match &current {
        Some(record) => {
          Self::credit(&record.pool_id, &record.owner, record.liquidity)?;
          TrackedPositions::<T>::insert(position, record);
        }
        None => TrackedPositions::<T>::remove(position),
      }

      Self::deposit_event(Event::Reconciled {
        position,
        previous: previous.map(|r| r.liquidity),
        current: current.map(|r| r.liquidity),
      });
      Ok(())
    }

    fn resync(position: PositionId) -> DispatchResult {
      let record = Self::snapshot(position)?;
      Self::credit(&record.pool_id, &record.owner, record.liquidity)?;
      TrackedPositions::<T>::insert(position, &record);
      Self::deposit_event(Event::Resynced {
        position,
        pool_id: record.pool_id,
        owner: record.owner,
        liquidity: record.liquidity,
      });
      Ok(())
    }

    fn ensure_manager(caller: &T::AccountId) -> Result<(), Error<T>> {
      ensure_trusted(caller, &T::TrustedManager::get()).map_err(|err| {
        log::warn!(
          target: LOG_TARGET,
          "rejected notification from untrusted caller {:?}",
          caller
        );
        Error::<T>::from(err)
      })
    }

    fn snapshot(position: PositionId) -> Result<PositionRecordOf<T>, Error<T>> {
      let owner = T::PositionManager::owner_of(position).ok_or(Error::<T>::UnknownPosition)?;
      let (key, _) =
        T::PositionManager::pool_and_position(position).ok_or(Error::<T>::UnknownPosition)?;
      let liquidity =
        T::PositionManager::position_liquidity(position).ok_or(Error::<T>::UnknownPosition)?;
      Ok(PositionRecord {
        pool_id: Self::pool_id(&key),
        owner,
        liquidity,
      })
    }

    fn credit(pool_id: &PoolIdOf<T>, owner: &T::AccountId, amount: Liquidity) -> DispatchResult {
      if amount == 0 {
        return Ok(());
      }
      LiquidityBalances::<T>::try_mutate(pool_id, owner, |balance| -> DispatchResult {
        *balance = balance
          .checked_add(amount)
          .ok_or(Error::<T>::BalanceOverflow)?;
        Ok(())
      })
    }

    fn debit(pool_id: &PoolIdOf<T>, owner: &T::AccountId, amount: Liquidity) -> DispatchResult {
      LiquidityBalances::<T>::try_mutate_exists(pool_id, owner, |balance| -> DispatchResult {
        let remaining = balance
          .unwrap_or_default()
          .checked_sub(amount)
          .ok_or(Error::<T>::InconsistentState)?;
        *balance = (remaining != 0).then_some(remaining);
        Ok(())
      })
    }

    /// Every mirrored balance equals the sum of its tracked records and none is zero.
    pub fn do_try_state() -> Result<(), DispatchError> {
      let mut expected: BTreeMap<(PoolIdOf<T>, T::AccountId), Liquidity> = BTreeMap::new();
      for (_, record) in TrackedPositions::<T>::iter() {
        let entry = expected.entry((record.pool_id, record.owner)).or_default();
        *entry = entry
          .checked_add(record.liquidity)
          .ok_or(DispatchError::Other("tracked liquidity overflows"))?;
      }
      for (pool_id, owner, balance) in LiquidityBalances::<T>::iter() {
        ensure!(balance != 0, DispatchError::Other("zero balance entry kept"));
        let tracked = expected.remove(&(pool_id, owner)).unwrap_or_default();
        ensure!(
          tracked == balance,
          DispatchError::Other("balance differs from tracked records")
        );
      }
      ensure!(
        expected.values().all(|liquidity| *liquidity == 0),
        DispatchError::Other("tracked liquidity without balance")
      );
      Ok(())
    }
  }

  impl<T: Config> PositionSubscriber<T::AccountId> for Pallet<T> {
    fn on_subscribe(caller: &T::AccountId, position: PositionId) -> DispatchResult {
      with_storage_layer(|| Self::do_subscribe(caller, position))
    }

    fn on_unsubscribe(caller: &T::AccountId, position: PositionId) -> DispatchResult {
      with_storage_layer(|| Self::do_unsubscribe(caller, position))
    }

    fn on_modify_liquidity(
      caller: &T::AccountId,
      position: PositionId,
      liquidity_change: i128,
    ) -> DispatchResult {
      with_storage_layer(|| Self::do_modify_liquidity(caller, position, liquidity_change))
    }

    fn on_burn(
      caller: &T::AccountId,
      position: PositionId,
      owner: &T::AccountId,
      liquidity: Liquidity,
    ) -> DispatchResult {
      with_storage_layer(|| Self::do_burn(caller, position, owner, liquidity))
    }
  }
}
