use crate as pallet_flash_orchestrator;
use crate::{AssetOps, CallbackRequest, FlashCallback, FlashPool, FlashReceiver, FungiblesAdapter};
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl,
  storage::with_storage_layer,
  traits::{ConstU16, ConstU32, ConstU64, ConstU128, Get},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{AssetKind, Balance, pallet_ids, params};
use sp_arithmetic::Permill;
use std::cell::RefCell;

pub type AccountId = u64;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const POOL: AccountId = 50;
pub const MALLORY: AccountId = 666;

pub const USDC: u32 = 1;
pub const ASSET: AssetKind = AssetKind::Local(USDC);
pub const POOL_LIQUIDITY: Balance = 1_000_000;
pub const INITIAL_BALANCE: Balance = 1_000;

/// Pool premium of 0.05%
pub fn premium(amount: Balance) -> Balance {
  Permill::from_parts(500) * amount
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReceiverBehavior {
  Repay,
  Shortchange,
  Fail,
  Reenter,
  CallbackDirectly,
}

thread_local! {
    pub static RECEIVER_BEHAVIOR: RefCell<ReceiverBehavior> = const { RefCell::new(ReceiverBehavior::Repay) };
    pub static LAST_RECEIVED: RefCell<Option<(AccountId, AssetKind, Balance, Balance, Vec<u8>)>> = const { RefCell::new(None) };
    pub static LAST_RECEIVER_RESULT: RefCell<Option<DispatchResult>> = const { RefCell::new(None) };
    pub static LAST_CALLBACK_RESULT: RefCell<Option<DispatchResult>> = const { RefCell::new(None) };
    pub static OBSERVED_ALLOWANCE: RefCell<Option<Balance>> = const { RefCell::new(None) };
    pub static REPORTED_AUTHORITY: RefCell<Option<AccountId>> = const { RefCell::new(None) };
    pub static REPORTED_INITIATOR: RefCell<Option<AccountId>> = const { RefCell::new(None) };
    pub static CONTEXT_OVERRIDE: RefCell<Option<Vec<u8>>> = const { RefCell::new(None) };
    pub static PULL_SHORTFALL: RefCell<Balance> = const { RefCell::new(0) };
}

pub fn set_receiver_behavior(behavior: ReceiverBehavior) {
  RECEIVER_BEHAVIOR.with(|b| *b.borrow_mut() = behavior);
}

pub fn last_callback_result() -> Option<DispatchResult> {
  LAST_CALLBACK_RESULT.with(|r| *r.borrow())
}

pub fn last_receiver_result() -> Option<DispatchResult> {
  LAST_RECEIVER_RESULT.with(|r| *r.borrow())
}

pub fn asset_balance(who: AccountId) -> Balance {
  MockAssets::balance(ASSET, &who)
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    FlashOrchestrator: pallet_flash_orchestrator,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = AccountId;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<Balance>;
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ();
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = Balance;
  type DustRemoval = ();
  type RuntimeEvent = RuntimeEvent;
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = ();
  type RuntimeFreezeReason = ();
  type DoneSlashHandler = ();
}

impl polkadot_sdk::pallet_assets::Config for Test {
  type RuntimeEvent = RuntimeEvent;
  type Balance = Balance;
  type AssetId = u32;
  type AssetIdParameter = u32;
  type Currency = Balances;
  type CreateOrigin = polkadot_sdk::frame_support::traits::AsEnsureOriginWithArg<
    frame_system::EnsureSigned<Self::AccountId>,
  >;
  type ForceOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type AssetDeposit = ConstU128<1>;
  type AssetAccountDeposit = ConstU128<1>;
  type MetadataDepositBase = ConstU128<1>;
  type MetadataDepositPerByte = ConstU128<1>;
  type ApprovalDeposit = ConstU128<0>;
  type StringLimit = ConstU32<50>;
  type Freezer = ();
  type Extra = ();
  type CallbackHandle = ();
  type WeightInfo = ();
  type RemoveItemsLimit = ConstU32<5>;
  type Holder = ();
  type ReserveData = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = ();
}

pub type MockAssets = FungiblesAdapter<Balances, Assets>;

/// Lending pool that charges `premium` and calls back through `FlashCallback`.
pub struct MockPool;
impl FlashPool<AccountId> for MockPool {
  fn borrow(
    initiator: &AccountId,
    receiver: &AccountId,
    asset: AssetKind,
    amount: Balance,
    context: Vec<u8>,
    _referral: u16,
  ) -> Result<(), DispatchError> {
    with_storage_layer(|| {
      let fee = premium(amount);
      MockAssets::transfer(asset, &POOL, receiver, amount)?;

      let request = CallbackRequest {
        asset,
        amount,
        fee,
        initiator: REPORTED_INITIATOR.with(|r| *r.borrow()).unwrap_or(*initiator),
        authority: REPORTED_AUTHORITY.with(|r| *r.borrow()).unwrap_or(POOL),
        context: CONTEXT_OVERRIDE
          .with(|c| c.borrow().clone())
          .unwrap_or(context),
      };
      let result = <FlashOrchestrator as FlashCallback<AccountId>>::execute_operation(request);
      LAST_CALLBACK_RESULT.with(|r| *r.borrow_mut() = Some(result));
      result?;

      let allowance = MockAssets::allowance(asset, receiver, &POOL);
      OBSERVED_ALLOWANCE.with(|a| *a.borrow_mut() = Some(allowance));
      let shortfall = PULL_SHORTFALL.with(|s| *s.borrow());
      MockAssets::transfer_from(asset, receiver, &POOL, &POOL, amount + fee - shortfall)
    })
  }
}

pub struct MockReceiver;
impl FlashReceiver<AccountId> for MockReceiver {
  fn on_flash_loan(
    receiver: &AccountId,
    asset: AssetKind,
    amount: Balance,
    fee: Balance,
    user_data: &[u8],
  ) -> Result<(), DispatchError> {
    LAST_RECEIVED.with(|r| *r.borrow_mut() = Some((*receiver, asset, amount, fee, user_data.to_vec())));
    let orchestrator = FlashOrchestrator::account_id();
    let result = match RECEIVER_BEHAVIOR.with(|b| *b.borrow()) {
      ReceiverBehavior::Repay => MockAssets::transfer(asset, receiver, &orchestrator, amount + fee),
      ReceiverBehavior::Shortchange => MockAssets::transfer(asset, receiver, &orchestrator, amount),
      ReceiverBehavior::Fail => Err(DispatchError::Other("receiver reverted")),
      ReceiverBehavior::Reenter => FlashOrchestrator::do_flash(*receiver, asset, amount, Vec::new()),
      ReceiverBehavior::CallbackDirectly => {
        <FlashOrchestrator as FlashCallback<AccountId>>::execute_operation(CallbackRequest {
          asset,
          amount,
          fee,
          initiator: orchestrator,
          authority: *receiver,
          context: Vec::new(),
        })
      }
    };
    LAST_RECEIVER_RESULT.with(|r| *r.borrow_mut() = Some(result));
    result
  }
}

pub struct FlashPalletId;
impl Get<PalletId> for FlashPalletId {
  fn get() -> PalletId {
    PalletId(*pallet_ids::FLASH_ORCHESTRATOR_PALLET_ID)
  }
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;
#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AccountId> for MockBenchmarkHelper {
  fn setup_flash_asset(_amount: Balance) -> AssetKind {
    ASSET
  }

  fn fund(asset: AssetKind, who: &AccountId, amount: Balance) {
    use polkadot_sdk::frame_support::traits::fungibles::Mutate;
    if let AssetKind::Local(id) = asset {
      let _ = <Assets as Mutate<AccountId>>::mint_into(id, who, amount);
    }
  }
}

impl pallet_flash_orchestrator::Config for Test {
  type Assets = MockAssets;
  type Pool = MockPool;
  type Receiver = MockReceiver;
  type TrustedPool = ConstU64<POOL>;
  type PalletId = FlashPalletId;
  type ReferralCode = ConstU16<{ params::DEFAULT_REFERRAL_CODE }>;
  type MaxUserData = ConstU32<64>;
  type MaxContextLen = ConstU32<128>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: vec![(ALICE, INITIAL_BALANCE), (BOB, INITIAL_BALANCE), (POOL, INITIAL_BALANCE)],
    dev_accounts: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: vec![(USDC, POOL, true, 1)],
    metadata: vec![],
    accounts: vec![
      (USDC, POOL, POOL_LIQUIDITY),
      (USDC, ALICE, INITIAL_BALANCE),
      (USDC, BOB, INITIAL_BALANCE),
    ],
    reserves: vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  pallet_flash_orchestrator::GenesisConfig::<Test>::default()
    .assimilate_storage(&mut t)
    .unwrap();

  RECEIVER_BEHAVIOR.with(|b| *b.borrow_mut() = ReceiverBehavior::Repay);
  LAST_RECEIVED.with(|r| *r.borrow_mut() = None);
  LAST_RECEIVER_RESULT.with(|r| *r.borrow_mut() = None);
  LAST_CALLBACK_RESULT.with(|r| *r.borrow_mut() = None);
  OBSERVED_ALLOWANCE.with(|a| *a.borrow_mut() = None);
  REPORTED_AUTHORITY.with(|r| *r.borrow_mut() = None);
  REPORTED_INITIATOR.with(|r| *r.borrow_mut() = None);
  CONTEXT_OVERRIDE.with(|c| *c.borrow_mut() = None);
  PULL_SHORTFALL.with(|s| *s.borrow_mut() = 0);

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| System::set_block_number(1));
  ext
}
