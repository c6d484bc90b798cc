//! Typed actions, batch assembly and the versioned wire form handed to the processor.

use alloc::vec::Vec;
use codec::{Decode, DecodeAll, DecodeWithMemTracking, Encode, MaxEncodedLen};
use primitives::{AssetKind, Balance, Liquidity, PoolKey, PositionId, PositionInfo, params};
use scale_info::TypeInfo;

/// Local failure of batch construction or pre-flight accounting
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BatchError {
  InvalidParameters,
  UnsettledCurrency,
  UnknownPosition,
  InconsistentState,
  TooManyActions,
}

#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  Ord,
  PartialEq,
  PartialOrd,
  TypeInfo,
  MaxEncodedLen,
)]
pub enum ActionKind {
  #[codec(index = 0)]
  BurnPosition,
  #[codec(index = 1)]
  MintPosition,
  #[codec(index = 2)]
  MintFromDeltas,
  #[codec(index = 3)]
  IncreaseLiquidity,
  #[codec(index = 4)]
  DecreaseLiquidity,
  #[codec(index = 5)]
  Settle,
  #[codec(index = 6)]
  SettlePair,
  #[codec(index = 7)]
  Take,
  #[codec(index = 8)]
  TakePair,
  #[codec(index = 9)]
  CloseCurrency,
  #[codec(index = 10)]
  Sweep,
}

impl ActionKind {
  /// Actions that close out an open currency balance
  pub fn is_settlement(self) -> bool {
    matches!(
      self,
      ActionKind::Settle
        | ActionKind::SettlePair
        | ActionKind::Take
        | ActionKind::TakePair
        | ActionKind::CloseCurrency
        | ActionKind::Sweep
    )
  }

  pub fn to_u8(self) -> u8 {
    self as u8
  }

  pub fn from_u8(raw: u8) -> Option<Self> {
    Self::decode(&mut &[raw][..]).ok()
  }
}

/// Kind-specific payload of an action.
///
/// Amounts named `*_min` bound what must come back, `*_max` bound what may be spent.
/// A `Settle` or `Take` amount of zero means the whole open balance.
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub enum ActionParams<AccountId> {
  BurnPosition {
    position: PositionId,
    amount0_min: Balance,
    amount1_min: Balance,
  },
  MintPosition {
    pool: PoolKey,
    range: PositionInfo,
    liquidity: Liquidity,
    amount0_max: Balance,
    amount1_max: Balance,
    owner: AccountId,
  },
  /// Mint with whatever the batch has credited so far, up to the given maxima
  MintFromDeltas {
    pool: PoolKey,
    range: PositionInfo,
    amount0_max: Balance,
    amount1_max: Balance,
    owner: AccountId,
  },
  IncreaseLiquidity {
    position: PositionId,
    liquidity: Liquidity,
    amount0_max: Balance,
    amount1_max: Balance,
  },
  DecreaseLiquidity {
    position: PositionId,
    liquidity: Liquidity,
    amount0_min: Balance,
    amount1_min: Balance,
  },
  Settle {
    currency: AssetKind,
    amount: Balance,
  },
  SettlePair {
    currency0: AssetKind,
    currency1: AssetKind,
  },
  Take {
    currency: AssetKind,
    recipient: AccountId,
    amount: Balance,
  },
  TakePair {
    currency0: AssetKind,
    currency1: AssetKind,
    recipient: AccountId,
  },
  CloseCurrency {
    currency: AssetKind,
  },
  Sweep {
    currency: AssetKind,
    recipient: AccountId,
  },
}

impl<AccountId> ActionParams<AccountId> {
  pub fn kind(&self) -> ActionKind {
    match self {
      ActionParams::BurnPosition { .. } => ActionKind::BurnPosition,
      ActionParams::MintPosition { .. } => ActionKind::MintPosition,
      ActionParams::MintFromDeltas { .. } => ActionKind::MintFromDeltas,
      ActionParams::IncreaseLiquidity { .. } => ActionKind::IncreaseLiquidity,
      ActionParams::DecreaseLiquidity { .. } => ActionKind::DecreaseLiquidity,
      ActionParams::Settle { .. } => ActionKind::Settle,
      ActionParams::SettlePair { .. } => ActionKind::SettlePair,
      ActionParams::Take { .. } => ActionKind::Take,
      ActionParams::TakePair { .. } => ActionKind::TakePair,
      ActionParams::CloseCurrency { .. } => ActionKind::CloseCurrency,
      ActionParams::Sweep { .. } => ActionKind::Sweep,
    }
  }

  fn is_well_formed(&self) -> bool {
    match self {
      ActionParams::MintPosition {
        pool,
        range,
        liquidity,
        ..
      } => pool.is_valid() && range.is_valid_for(pool.tick_spacing) && *liquidity > 0,
      ActionParams::MintFromDeltas { pool, range, .. } => {
        pool.is_valid() && range.is_valid_for(pool.tick_spacing)
      }
      ActionParams::IncreaseLiquidity { liquidity, .. }
      | ActionParams::DecreaseLiquidity { liquidity, .. } => *liquidity > 0,
      ActionParams::SettlePair {
        currency0,
        currency1,
      }
      | ActionParams::TakePair {
        currency0,
        currency1,
        ..
      } => currency0 != currency1,
      ActionParams::BurnPosition { .. }
      | ActionParams::Settle { .. }
      | ActionParams::Take { .. }
      | ActionParams::CloseCurrency { .. }
      | ActionParams::Sweep { .. } => true,
    }
  }

  /// Position the action operates on, when it refers to an existing one
  pub fn position(&self) -> Option<PositionId> {
    match self {
      ActionParams::BurnPosition { position, .. }
      | ActionParams::IncreaseLiquidity { position, .. }
      | ActionParams::DecreaseLiquidity { position, .. } => Some(*position),
      _ => None,
    }
  }

  /// Pool carried by the action itself
  pub fn pool(&self) -> Option<PoolKey> {
    match self {
      ActionParams::MintPosition { pool, .. } | ActionParams::MintFromDeltas { pool, .. } => {
        Some(*pool)
      }
      _ => None,
    }
  }

  /// Currencies a settlement-class action closes
  pub fn settled_currencies(&self) -> Vec<AssetKind> {
    match self {
      ActionParams::Settle { currency, .. }
      | ActionParams::Take { currency, .. }
      | ActionParams::CloseCurrency { currency }
      | ActionParams::Sweep { currency, .. } => alloc::vec![*currency],
      ActionParams::SettlePair {
        currency0,
        currency1,
      }
      | ActionParams::TakePair {
        currency0,
        currency1,
        ..
      } => alloc::vec![*currency0, *currency1],
      _ => Vec::new(),
    }
  }
}

/// One typed operation of a batch
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub struct Action<AccountId> {
  pub kind: ActionKind,
  pub params: ActionParams<AccountId>,
}

impl<AccountId> Action<AccountId> {
  pub fn new(kind: ActionKind, params: ActionParams<AccountId>) -> Result<Self, BatchError> {
    let action = Self { kind, params };
    action.validate()?;
    Ok(action)
  }

  /// Actions arriving from outside are re-checked with this before use.
  pub fn validate(&self) -> Result<(), BatchError> {
    if self.params.kind() != self.kind || !self.params.is_well_formed() {
      return Err(BatchError::InvalidParameters);
    }
    Ok(())
  }
}

/// Ordered actions plus the limits of their single submission
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Batch<AccountId, BlockNumber> {
  pub actions: Vec<Action<AccountId>>,
  pub deadline: BlockNumber,
  pub native_value: Balance,
}

/// Appends validated actions in execution order.
pub struct BatchBuilder<AccountId> {
  actions: Vec<Action<AccountId>>,
  max_actions: u32,
}

impl<AccountId> BatchBuilder<AccountId> {
  pub fn new(max_actions: u32) -> Self {
    Self {
      actions: Vec::new(),
      max_actions,
    }
  }

  pub fn add_action(
    &mut self,
    kind: ActionKind,
    params: ActionParams<AccountId>,
  ) -> Result<&mut Self, BatchError> {
    if self.actions.len() as u32 >= self.max_actions {
      return Err(BatchError::TooManyActions);
    }
    self.actions.push(Action::new(kind, params)?);
    Ok(self)
  }

  pub fn actions(&self) -> &[Action<AccountId>] {
    &self.actions
  }

  pub fn finish<BlockNumber>(
    self,
    deadline: BlockNumber,
    native_value: Balance,
  ) -> Batch<AccountId, BlockNumber> {
    Batch {
      actions: self.actions,
      deadline,
      native_value,
    }
  }
}

#[derive(Decode, Encode)]
struct EncodedBatch {
  version: u8,
  kinds: Vec<u8>,
  params: Vec<Vec<u8>>,
}

/// Wire form: version byte, one kind byte per action, one payload per action.
pub fn encode_batch<AccountId: Encode>(actions: &[Action<AccountId>]) -> Vec<u8> {
  EncodedBatch {
    version: params::BATCH_ENCODING_VERSION,
    kinds: actions.iter().map(|a| a.kind.to_u8()).collect(),
    params: actions.iter().map(|a| a.params.encode()).collect(),
  }
  .encode()
}

/// Inverse of [`encode_batch`]; every payload must match its declared kind exactly.
pub fn decode_batch<AccountId: Decode>(bytes: &[u8]) -> Result<Vec<Action<AccountId>>, BatchError> {
  let raw = EncodedBatch::decode_all(&mut &bytes[..]).map_err(|_| BatchError::InvalidParameters)?;
  if raw.version != params::BATCH_ENCODING_VERSION || raw.kinds.len() != raw.params.len() {
    return Err(BatchError::InvalidParameters);
  }
  raw
    .kinds
    .iter()
    .zip(raw.params.iter())
    .map(|(kind, payload)| {
      let kind = ActionKind::from_u8(*kind).ok_or(BatchError::InvalidParameters)?;
      let params = ActionParams::<AccountId>::decode_all(&mut &payload[..])
        .map_err(|_| BatchError::InvalidParameters)?;
      Action::new(kind, params)
    })
    .collect()
}
