use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Trading days used to annualize daily statistics
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// sqrt(252), used when `Decimal::sqrt` cannot converge
pub const SQRT_TRADING_DAYS_APPROX: Decimal = dec!(15.874507866);

/// Default benchmark index for recommendations
pub const DEFAULT_BENCHMARK_TICKER: &str = "^NSEI";

/// Paper-trading capital assigned to a new portfolio
pub const DEFAULT_INITIAL_BALANCE: Decimal = dec!(1000000);

/// Maximum history processed by the daily return calculator
pub const DEFAULT_LOOKBACK_CAP_DAYS: i64 = 730;

/// Upper bound accepted for the lookback cap (about a century)
pub const MAX_LOOKBACK_CAP_DAYS: i64 = 36_500;

/// Minimum lookback used for the monthly rolling window
pub const MONTH_WINDOW_MIN_LOOKBACK_DAYS: i64 = 180;

/// Wall-clock budget for one daily return computation
pub const DEFAULT_COMPUTE_BUDGET_SECS: u64 = 30;

/// Timeout applied to each ticker's history fetch
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

/// Concurrent history requests when the source sets no limit
pub const DEFAULT_FETCH_CONCURRENCY: usize = 5;

/// Price history cache time-to-live
pub const DEFAULT_PRICE_CACHE_TTL_SECS: u64 = 300;

/// Most price histories held by the in-memory cache
pub const DEFAULT_PRICE_CACHE_MAX_ENTRIES: usize = 512;

/// Annual risk-free rate used by the Sharpe ratio
pub const DEFAULT_RISK_FREE_RATE: Decimal = dec!(0.05);

/// Calendar tables always start no later than this year
pub const DEFAULT_CALENDAR_START_YEAR: i32 = 2020;

/// Tolerance for the 100% weight invariant, in percentage points
pub const WEIGHT_SUM_TOLERANCE: Decimal = dec!(0.01);

/// Fractional remaining weight treated as zero by the rebalancer
pub const REMAINING_WEIGHT_EPSILON: Decimal = dec!(0.001);

/// Number of most recent daily returns feeding the risk score
pub const RISK_SCORE_WINDOW: usize = 7;

/// Neutral risk score when there is too little data
pub const NEUTRAL_RISK_SCORE: Decimal = dec!(5);

/// Minimum daily points required for the profitable-weeks metric
pub const PROFITABLE_WEEKS_MIN_POINTS: usize = 7;

/// Number of entries in the best/worst trade tables
pub const TRADE_TABLE_SIZE: usize = 10;

/// Extra calendar days fetched before the first entry so LOCF lookups
/// have a prior close to fall back on
pub const HISTORY_PADDING_DAYS: i64 = 10;

/// Decimal precision for reported metrics
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;
