use crate as pallet_batch_executor;
use crate::{ActionParams, BatchProcessor, BatchReceipt, decode_batch};
use pallet_position_ledger::PositionSubscriber;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl,
  traits::{ConstU32, ConstU64, Get},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{
  AssetKind, Balance, Liquidity, PoolKey, PositionId, PositionInfo, PositionInspect, pallet_ids,
};
use sp_arithmetic::Permill;
use std::cell::RefCell;
use std::collections::BTreeMap;

pub type AccountId = u64;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const MANAGER: AccountId = 100;

pub const TOKEN: AssetKind = AssetKind::Local(1);
pub const OTHER: AssetKind = AssetKind::Local(2);

#[derive(Clone, Debug)]
pub struct MockPosition {
  pub owner: AccountId,
  pub pool: PoolKey,
  pub info: PositionInfo,
  pub liquidity: Liquidity,
  pub subscriber: Option<AccountId>,
}

#[derive(Clone, Debug, Default)]
pub struct ProcessorState {
  pub positions: BTreeMap<PositionId, MockPosition>,
  pub next_id: PositionId,
}

thread_local! {
    pub static STATE: RefCell<ProcessorState> = RefCell::new(ProcessorState::default());
    pub static SUBMITTED: RefCell<u32> = const { RefCell::new(0) };
    pub static LAST_ENCODED: RefCell<Option<Vec<u8>>> = const { RefCell::new(None) };
    pub static REPORT_SKEW: RefCell<Option<(AssetKind, i128)>> = const { RefCell::new(None) };
}

/// Native / TOKEN pool
pub fn pool_p() -> PoolKey {
  PoolKey::new(AssetKind::Native, TOKEN, Permill::from_parts(3_000), 60)
}

/// TOKEN / OTHER pool
pub fn pool_q() -> PoolKey {
  PoolKey::new(TOKEN, OTHER, Permill::from_parts(500), 10)
}

pub fn submitted() -> u32 {
  SUBMITTED.with(|s| *s.borrow())
}

pub fn position(id: PositionId) -> Option<MockPosition> {
  STATE.with(|s| s.borrow().positions.get(&id).cloned())
}

fn with_state<R>(f: impl FnOnce(&mut ProcessorState) -> R) -> R {
  STATE.with(|s| f(&mut s.borrow_mut()))
}

fn insert_position(
  owner: AccountId,
  pool: PoolKey,
  info: PositionInfo,
  liquidity: Liquidity,
) -> PositionId {
  with_state(|state| {
    let id = state.next_id;
    state.next_id += 1;
    state.positions.insert(
      id,
      MockPosition {
        owner,
        pool,
        info,
        liquidity,
        subscriber: None,
      },
    );
    id
  })
}

/// Opens a position directly on the manager, outside of any batch.
pub fn create_position(owner: AccountId, pool: PoolKey, liquidity: Liquidity) -> PositionId {
  let spacing = pool.tick_spacing;
  insert_position(
    owner,
    pool,
    PositionInfo {
      tick_lower: -2 * spacing,
      tick_upper: 2 * spacing,
    },
    liquidity,
  )
}

/// Registers the ledger as subscriber of `id` and delivers the subscribe notification.
pub fn subscribe(id: PositionId) -> DispatchResult {
  with_state(|state| {
    if let Some(position) = state.positions.get_mut(&id) {
      position.subscriber = Some(PositionLedger::account_id());
    }
  });
  PositionLedger::notify_subscribe(RuntimeOrigin::signed(MANAGER), id)
}

pub fn ledger_balance(pool: &PoolKey, owner: AccountId) -> Liquidity {
  PositionLedger::liquidity_balance(PositionLedger::pool_id(pool), owner)
}

fn notifies_ledger(position: &MockPosition) -> bool {
  position.subscriber == Some(PositionLedger::account_id())
}

/// Per-batch balances: `open` is what the manager owes (positive) or is owed (negative),
/// `user` is the net flow to the initiator.
#[derive(Default)]
struct Session {
  open: BTreeMap<AssetKind, i128>,
  user: BTreeMap<AssetKind, i128>,
  escrow: Balance,
  minted: Vec<PositionId>,
}

impl Session {
  fn shift(map: &mut BTreeMap<AssetKind, i128>, currency: AssetKind, amount: i128) {
    *map.entry(currency).or_insert(0) += amount;
  }

  fn settle(&mut self, currency: AssetKind, amount: Balance) {
    let debt = (-self.open.get(&currency).copied().unwrap_or(0)).max(0) as Balance;
    let pay = if amount == 0 { debt } else { amount };
    Self::shift(&mut self.open, currency, pay as i128);
    let from_escrow = if currency == AssetKind::Native {
      pay.min(self.escrow)
    } else {
      0
    };
    self.escrow -= from_escrow;
    Self::shift(&mut self.user, currency, -((pay - from_escrow) as i128));
  }

  fn take(
    &mut self,
    who: AccountId,
    currency: AssetKind,
    recipient: AccountId,
    amount: Balance,
  ) -> DispatchResult {
    let credit = self.open.get(&currency).copied().unwrap_or(0).max(0) as Balance;
    let taken = if amount == 0 { credit } else { amount };
    if taken > credit {
      return Err(DispatchError::Other("take exceeds credit"));
    }
    Self::shift(&mut self.open, currency, -(taken as i128));
    Self::shift(&mut self.user, currency, if recipient == who { taken as i128 } else { 0 });
    Ok(())
  }
}

fn owned(who: AccountId, id: PositionId) -> Result<MockPosition, DispatchError> {
  let position = position(id).ok_or(DispatchError::Other("no such position"))?;
  if position.owner != who {
    return Err(DispatchError::Other("not owner"));
  }
  Ok(position)
}

/// Concentrated-liquidity manager where one unit of liquidity costs one unit of each currency.
pub struct MockProcessor;

impl MockProcessor {
  fn run(
    who: AccountId,
    actions: &[crate::Action<AccountId>],
    native_value: Balance,
  ) -> Result<BatchReceipt, DispatchError> {
    let mut session = Session {
      escrow: native_value,
      ..Default::default()
    };
    if native_value > 0 {
      Session::shift(&mut session.user, AssetKind::Native, -(native_value as i128));
    }

    for action in actions {
      match action.params.clone() {
        ActionParams::BurnPosition {
          position,
          amount0_min,
          amount1_min,
        } => {
          let burned = owned(who, position)?;
          if burned.liquidity < amount0_min || burned.liquidity < amount1_min {
            return Err(DispatchError::Other("slippage"));
          }
          Session::shift(&mut session.open, burned.pool.currency0, burned.liquidity as i128);
          Session::shift(&mut session.open, burned.pool.currency1, burned.liquidity as i128);
          with_state(|state| state.positions.remove(&position));
          if notifies_ledger(&burned) {
            PositionLedger::on_burn(&MANAGER, position, &burned.owner, burned.liquidity)?;
          }
        }
        ActionParams::MintPosition {
          pool,
          range,
          liquidity,
          amount0_max,
          amount1_max,
          owner,
        } => {
          if liquidity > amount0_max || liquidity > amount1_max {
            return Err(DispatchError::Other("slippage"));
          }
          Session::shift(&mut session.open, pool.currency0, -(liquidity as i128));
          Session::shift(&mut session.open, pool.currency1, -(liquidity as i128));
          session.minted.push(insert_position(owner, pool, range, liquidity));
        }
        ActionParams::MintFromDeltas {
          pool,
          range,
          amount0_max,
          amount1_max,
          owner,
        } => {
          let credit = |c: AssetKind| session.open.get(&c).copied().unwrap_or(0).max(0) as Balance;
          let liquidity = credit(pool.currency0)
            .min(credit(pool.currency1))
            .min(amount0_max)
            .min(amount1_max);
          if liquidity == 0 {
            return Err(DispatchError::Other("nothing to mint from"));
          }
          Session::shift(&mut session.open, pool.currency0, -(liquidity as i128));
          Session::shift(&mut session.open, pool.currency1, -(liquidity as i128));
          session.minted.push(insert_position(owner, pool, range, liquidity));
        }
        ActionParams::IncreaseLiquidity {
          position,
          liquidity,
          amount0_max,
          amount1_max,
        } => {
          let current = owned(who, position)?;
          if liquidity > amount0_max || liquidity > amount1_max {
            return Err(DispatchError::Other("slippage"));
          }
          Session::shift(&mut session.open, current.pool.currency0, -(liquidity as i128));
          Session::shift(&mut session.open, current.pool.currency1, -(liquidity as i128));
          with_state(|state| {
            if let Some(p) = state.positions.get_mut(&position) {
              p.liquidity += liquidity;
            }
          });
          if notifies_ledger(&current) {
            PositionLedger::on_modify_liquidity(&MANAGER, position, liquidity as i128)?;
          }
        }
        ActionParams::DecreaseLiquidity {
          position,
          liquidity,
          amount0_min,
          amount1_min,
        } => {
          let current = owned(who, position)?;
          if current.liquidity < liquidity {
            return Err(DispatchError::Other("insufficient liquidity"));
          }
          if liquidity < amount0_min || liquidity < amount1_min {
            return Err(DispatchError::Other("slippage"));
          }
          Session::shift(&mut session.open, current.pool.currency0, liquidity as i128);
          Session::shift(&mut session.open, current.pool.currency1, liquidity as i128);
          with_state(|state| {
            if let Some(p) = state.positions.get_mut(&position) {
              p.liquidity -= liquidity;
            }
          });
          if notifies_ledger(&current) {
            PositionLedger::on_modify_liquidity(&MANAGER, position, -(liquidity as i128))?;
          }
        }
        ActionParams::Settle { currency, amount } => session.settle(currency, amount),
        ActionParams::SettlePair {
          currency0,
          currency1,
        } => {
          session.settle(currency0, 0);
          session.settle(currency1, 0);
        }
        ActionParams::Take {
          currency,
          recipient,
          amount,
        } => session.take(who, currency, recipient, amount)?,
        ActionParams::TakePair {
          currency0,
          currency1,
          recipient,
        } => {
          session.take(who, currency0, recipient, 0)?;
          session.take(who, currency1, recipient, 0)?;
        }
        ActionParams::CloseCurrency { currency } => {
          if session.open.get(&currency).copied().unwrap_or(0) < 0 {
            session.settle(currency, 0);
          } else {
            session.take(who, currency, who, 0)?;
          }
        }
        ActionParams::Sweep {
          currency,
          recipient,
        } => {
          if currency == AssetKind::Native {
            if recipient == who {
              Session::shift(&mut session.user, AssetKind::Native, session.escrow as i128);
            }
            session.escrow = 0;
          }
        }
      }
    }

    if session.open.values().any(|delta| *delta != 0) {
      return Err(DispatchError::Other("currency not settled"));
    }
    if let Some((asset, skew)) = REPORT_SKEW.with(|r| *r.borrow()) {
      Session::shift(&mut session.user, asset, skew);
    }
    Ok(BatchReceipt {
      deltas: session.user.into_iter().collect(),
      minted: session.minted,
    })
  }
}

impl PositionInspect<AccountId> for MockProcessor {
  fn owner_of(id: PositionId) -> Option<AccountId> {
    position(id).map(|p| p.owner)
  }

  fn pool_and_position(id: PositionId) -> Option<(PoolKey, PositionInfo)> {
    position(id).map(|p| (p.pool, p.info))
  }

  fn position_liquidity(id: PositionId) -> Option<Liquidity> {
    position(id).map(|p| p.liquidity)
  }

  fn subscriber_of(id: PositionId) -> Option<AccountId> {
    position(id).and_then(|p| p.subscriber)
  }
}

impl BatchProcessor<AccountId, u64> for MockProcessor {
  fn next_position_id() -> PositionId {
    STATE.with(|s| s.borrow().next_id)
  }

  fn execute_batch(
    who: &AccountId,
    encoded_actions: Vec<u8>,
    native_value: Balance,
    deadline: u64,
  ) -> Result<BatchReceipt, DispatchError> {
    SUBMITTED.with(|s| *s.borrow_mut() += 1);
    LAST_ENCODED.with(|e| *e.borrow_mut() = Some(encoded_actions.clone()));
    if System::block_number() > deadline {
      return Err(DispatchError::Other("deadline passed"));
    }
    let actions = decode_batch::<AccountId>(&encoded_actions)
      .map_err(|_| DispatchError::Other("undecodable batch"))?;

    let snapshot = STATE.with(|s| s.borrow().clone());
    let result = Self::run(*who, &actions, native_value);
    if result.is_err() {
      STATE.with(|s| *s.borrow_mut() = snapshot);
    }
    result
  }
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    PositionLedger: pallet_position_ledger,
    BatchExecutor: pallet_batch_executor,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = AccountId;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
}

pub struct LedgerPalletId;
impl Get<PalletId> for LedgerPalletId {
  fn get() -> PalletId {
    PalletId(*pallet_ids::POSITION_LEDGER_PALLET_ID)
  }
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl pallet_position_ledger::BenchmarkHelper<AccountId> for MockBenchmarkHelper {
  fn create_position(id: PositionId, owner: &AccountId, liquidity: Liquidity) {
    with_state(|state| {
      state.next_id = state.next_id.max(id + 1);
      state.positions.insert(
        id,
        MockPosition {
          owner: *owner,
          pool: pool_p(),
          info: PositionInfo {
            tick_lower: -120,
            tick_upper: 120,
          },
          liquidity,
          subscriber: Some(PositionLedger::account_id()),
        },
      );
    });
  }
}

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AccountId> for MockBenchmarkHelper {
  fn pool() -> PoolKey {
    pool_p()
  }

  fn create_position(owner: &AccountId, liquidity: Liquidity) -> PositionId {
    create_position(*owner, pool_p(), liquidity)
  }

  fn fund(_who: &AccountId, _amount: Balance) {}
}

impl pallet_position_ledger::Config for Test {
  type PositionManager = MockProcessor;
  type TrustedManager = ConstU64<MANAGER>;
  type PalletId = LedgerPalletId;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

impl pallet_batch_executor::Config for Test {
  type Processor = MockProcessor;
  type MaxActions = ConstU32<8>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  STATE.with(|s| {
    *s.borrow_mut() = ProcessorState {
      positions: BTreeMap::new(),
      next_id: 1,
    }
  });
  SUBMITTED.with(|s| *s.borrow_mut() = 0);
  LAST_ENCODED.with(|e| *e.borrow_mut() = None);
  REPORT_SKEW.with(|r| *r.borrow_mut() = None);

  let storage = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();
  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(storage);
  ext.execute_with(|| System::set_block_number(1));
  ext
}
