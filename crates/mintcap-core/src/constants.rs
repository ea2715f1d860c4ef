/// ─── Mintcap Protocol Constants ─────────────────────────────────────────────
///
/// Genesis supply: 1,000,000,000 MCP credited to the admin account.
/// Base unit:      1 MCP = 10^18 units
/// Issuance:       at most 5% of the genesis supply per year bucket.

// ── Units ────────────────────────────────────────────────────────────────────

pub const TOKEN_SYMBOL: &str = "MCP";

pub const DECIMALS: u32 = 18;

/// 1 MCP expressed in base units.
pub const UNITS_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

// ── Supply ───────────────────────────────────────────────────────────────────

/// Genesis allocation in whole tokens.
pub const INITIAL_SUPPLY_TOKENS: u128 = 1_000_000_000;

/// Genesis allocation in base units. Exempt from the annual cap.
pub const INITIAL_SUPPLY: u128 = INITIAL_SUPPLY_TOKENS * UNITS_PER_TOKEN;

/// Maximum cumulative mint per year bucket: 5% of the genesis supply.
pub const MAX_ANNUAL_MINT: u128 = INITIAL_SUPPLY / 20;

// ── Time ─────────────────────────────────────────────────────────────────────

/// Length of one year bucket. Fixed 365-day years: buckets drift away from
/// calendar years and are never realigned.
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 3600;
