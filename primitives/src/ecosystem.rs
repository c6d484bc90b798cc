//! Ecosystem constants shared by the batch executor, flash orchestrator and position ledger.
//!
//! These are the single source of truth for pallet account derivation and wire-level
//! versioning, re-used by pallet configurations and their tests.

/// Balance type alias for consistency across pallets
pub type Balance = u128;

/// Pallet identifiers for deriving pallet-owned accounts.
///
/// Used with `PalletId::into_account_truncating()` to deterministically generate
/// the account that acts on behalf of each pallet.
pub mod pallet_ids {
  /// Action-batch executor pallet ID
  pub const BATCH_EXECUTOR_PALLET_ID: &[u8; 8] = b"batchexe";

  /// Flash-operation orchestrator pallet ID (borrower and callback target)
  pub const FLASH_ORCHESTRATOR_PALLET_ID: &[u8; 8] = b"flashorc";

  /// Position-lifecycle ledger pallet ID (notification subscriber)
  pub const POSITION_LEDGER_PALLET_ID: &[u8; 8] = b"posledgr";
}

/// Protocol parameters shared by every component.
pub mod params {
  /// Lowest tick a concentrated-liquidity position may start at
  pub const MIN_TICK: i32 = -887_272;

  /// Highest tick a concentrated-liquidity position may end at
  pub const MAX_TICK: i32 = 887_272;

  /// Version byte prefixed to every encoded action batch
  pub const BATCH_ENCODING_VERSION: u8 = 1;

  /// Default referral code forwarded with flash borrows
  pub const DEFAULT_REFERRAL_CODE: u16 = 0;
}
